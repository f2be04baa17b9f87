//! GPIO transport implementations
//!
//! A [`GpioPort`] is a single 8-bit bit-bang port. Three implementations are
//! provided: a real dual-channel FTDI FT2232H-class bridge, an in-process
//! simulated NAND chip for tests and hardware-free operation, and a mock
//! used by the protocol unit tests.

pub mod ftdi;
pub mod mock;
pub mod simulated;
pub mod traits;

pub use ftdi::{FtdiBitbangPort, FtdiChannel};
pub use mock::MockGpioPort;
pub use simulated::{SimulatedCtrlPort, SimulatedIoPort, SimulatedNandChip};
pub use traits::GpioPort;
