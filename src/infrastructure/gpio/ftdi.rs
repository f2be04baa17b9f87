//! Dual-channel FTDI FT2232H-class bridge in asynchronous bit-bang mode
//!
//! Each of the two interfaces on the chip is opened as an independent
//! [`GpioPort`]: interface A carries the NAND I/O bus, interface B the
//! control bus. This mirrors the original tool's use of `libftdi`
//! (`ftdi_set_interface` + `ftdi_usb_open` per channel, `ftdi_set_bitmode`
//! with `BITMODE_BITBANG`, `ftdi_write_data`/`ftdi_read_pins`), expressed
//! over `nusb` the way this crate's other USB-vendor backends build their
//! control-transfer helpers.

use futures_lite::future::block_on;
use log::debug;
use nusb::transfer::{ControlIn, ControlOut, ControlType, Recipient, RequestBuffer};

use crate::error::{Error, Result};
use crate::infrastructure::gpio::traits::GpioPort;

/// FTDI vendor ID.
pub const FTDI_VID: u16 = 0x0403;
/// FT2232H product ID.
pub const FT2232H_PID: u16 = 0x6010;

/// FTDI interface indices, one per physical channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtdiChannel {
    A,
    B,
}

impl FtdiChannel {
    fn interface_index(self) -> u8 {
        match self {
            FtdiChannel::A => 0,
            FtdiChannel::B => 1,
        }
    }

    fn endpoints(self) -> (u8, u8) {
        match self {
            FtdiChannel::A => (0x02, 0x81),
            FtdiChannel::B => (0x04, 0x83),
        }
    }

    fn interface_select_index(self) -> u16 {
        // FTDI vendor requests address a channel via the high byte of wIndex.
        (self.interface_index() as u16 + 1) << 8
    }
}

// FTDI vendor request numbers (see FTDI AN_232B-05 and libftdi's ftdi.c).
const SIO_RESET_REQUEST: u8 = 0x00;
const SIO_SET_BITMODE_REQUEST: u8 = 0x0B;
const SIO_READ_PINS_REQUEST: u8 = 0x0C;

const SIO_RESET_SIO: u16 = 0x00;
const BITMODE_BITBANG: u8 = 0x01;

/// One FTDI channel, configured for asynchronous bit-bang mode.
pub struct FtdiBitbangPort {
    name: &'static str,
    interface: nusb::Interface,
    channel: FtdiChannel,
    ep_out: u8,
}

impl FtdiBitbangPort {
    /// Open `channel` on `device` and put it into async bit-bang mode with
    /// the given initial direction mask (bit = 1 means output).
    pub fn open(
        device: &nusb::Device,
        channel: FtdiChannel,
        direction_mask: u8,
        name: &'static str,
    ) -> Result<Self> {
        let interface = device.claim_interface(channel.interface_index())?;
        let (ep_out, _ep_in) = channel.endpoints();

        let mut port = Self {
            name,
            interface,
            channel,
            ep_out,
        };
        port.reset()?;
        port.set_direction_mask(direction_mask)?;
        Ok(port)
    }

    fn reset(&mut self) -> Result<()> {
        debug!("{}: resetting FTDI channel", self.name);
        self.control_out(SIO_RESET_REQUEST, SIO_RESET_SIO)
    }

    fn control_out(&self, request: u8, value: u16) -> Result<()> {
        let index = self.channel.interface_select_index();
        let result = block_on(async {
            self.interface
                .control_out(ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    data: &[],
                })
                .await
        });
        result
            .status
            .map_err(|e| Error::TransportFailed(e.to_string()))?;
        Ok(())
    }

    fn control_in(&self, request: u8, value: u16, len: usize) -> Result<Vec<u8>> {
        let index = self.channel.interface_select_index();
        let result = block_on(async {
            self.interface
                .control_in(ControlIn {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    length: len as u16,
                })
                .await
                .into_result()
        })
        .map_err(|e| Error::TransportFailed(e.to_string()))?;
        Ok(result)
    }
}

impl GpioPort for FtdiBitbangPort {
    fn name(&self) -> &str {
        self.name
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        let result = block_on(async { self.interface.bulk_out(self.ep_out, vec![byte]).await });
        result.status?;
        Ok(())
    }

    fn read_pins(&mut self) -> Result<u8> {
        let pins = self.control_in(SIO_READ_PINS_REQUEST, 0, 1)?;
        Ok(*pins.first().unwrap_or(&0xFF))
    }

    fn set_direction_mask(&mut self, mask: u8) -> Result<()> {
        debug!("{}: setting direction mask 0x{:02X}", self.name, mask);
        let value = ((mask as u16) << 8) | BITMODE_BITBANG as u16;
        self.control_out(SIO_SET_BITMODE_REQUEST, value)
    }
}

/// Locate the first attached FT2232H-class bridge.
pub fn find_device() -> Result<nusb::Device> {
    let info = nusb::list_devices()?
        .find(|d| d.vendor_id() == FTDI_VID && d.product_id() == FT2232H_PID)
        .ok_or(Error::TransportNotFound)?;
    Ok(info.open()?)
}
