//! GPIO port abstraction
//!
//! Generalizes a single 8-bit bit-bang port: write a byte, sample the pins,
//! and flip the port-wide direction. The NAND session (see
//! [`crate::infrastructure::flash_protocol::nand`]) holds two of these — one
//! for the control bus, one for the I/O bus — and never assumes anything
//! about timing beyond "each call is flushed before the next observes its
//! effect".

use crate::error::Result;

/// A single 8-bit GPIO port with settable per-bit direction.
pub trait GpioPort {
    /// Human-readable name, for diagnostics and self-test output.
    fn name(&self) -> &str;

    /// Drive `byte` onto the port's output-configured pins.
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Sample the current electrical state of all eight pins.
    fn read_pins(&mut self) -> Result<u8>;

    /// Reconfigure the port-wide direction. Bit = 1 means output.
    fn set_direction_mask(&mut self, mask: u8) -> Result<()>;
}

impl GpioPort for Box<dyn GpioPort> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_byte(byte)
    }

    fn read_pins(&mut self) -> Result<u8> {
        (**self).read_pins()
    }

    fn set_direction_mask(&mut self, mask: u8) -> Result<()> {
        (**self).set_direction_mask(mask)
    }
}
