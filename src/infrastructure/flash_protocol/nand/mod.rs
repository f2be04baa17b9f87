//! Parallel NAND protocol engine
//!
//! A [`NandSession`] owns the two GPIO ports (I/O bus and control bus) and
//! the shadow bytes mirroring their last-written state, and exposes the
//! latch primitives, command sequences, and operation drivers described in
//! this crate's protocol documentation. It replaces the free-function /
//! global-mutable style of the hardware tool this was distilled from with a
//! single owned value threaded through every call, so the "one exclusive
//! owner of the bus" contract is enforced by the type system instead of by
//! convention.

#[cfg(test)]
mod tests;

use std::io::{Read, Seek, SeekFrom, Write};
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::domain::{
    pack_full_address, pack_row_address, ControlPin, IdRegister, NandGeometry, Progress,
    SkipPolicy, StatusRegister, CTRL_DIRECTION_MASK, CTRL_SHADOW_RESET, IO_DIRECTION_INPUT,
    IO_DIRECTION_OUTPUT,
};
use crate::error::{Error, Result};
use crate::infrastructure::gpio::GpioPort;

/// Tuning knobs that do not change the protocol's shape, only its timing.
#[derive(Debug, Clone, Copy)]
pub struct NandSessionOptions {
    /// Delay inserted around each nWE/nRE edge, in microseconds. Zero by
    /// default, matching the reference tool.
    pub edge_delay_us: u64,
    /// Optional hard bound on `wait_ready`'s busy-poll loop. Disabled
    /// (unbounded) by default, since the reference design has no timeout.
    pub busy_timeout: Option<Duration>,
    /// Settle time after power-up before the wiring sample is taken.
    /// 500ms by default, matching the reference tool; tests that don't care
    /// about real timing set this to zero.
    pub settle_delay: Duration,
}

impl Default for NandSessionOptions {
    fn default() -> Self {
        Self {
            edge_delay_us: 0,
            busy_timeout: None,
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// Owns the two GPIO ports and the shadow bytes that mirror their last
/// written value, for the lifetime of a single programming session.
pub struct NandSession<IO: GpioPort, CTRL: GpioPort> {
    io: IO,
    ctrl: CTRL,
    io_shadow: u8,
    ctrl_shadow: u8,
    geometry: NandGeometry,
    options: NandSessionOptions,
}

impl<IO: GpioPort, CTRL: GpioPort> NandSession<IO, CTRL> {
    /// Acquire the two ports and run the one-time bring-up sequence: set
    /// directions, push zeroed shadows, wait for the part to settle, sample
    /// both ports once for a wiring sanity check, and settle into the idle
    /// control state (nRE high, nCE low, nWP low).
    pub fn bring_up(
        mut io: IO,
        mut ctrl: CTRL,
        geometry: NandGeometry,
        options: NandSessionOptions,
    ) -> Result<(Self, WiringSample)> {
        ctrl.set_direction_mask(CTRL_DIRECTION_MASK)?;
        io.set_direction_mask(IO_DIRECTION_OUTPUT)?;

        let mut session = Self {
            io,
            ctrl,
            io_shadow: CTRL_SHADOW_RESET,
            ctrl_shadow: CTRL_SHADOW_RESET,
            geometry,
            options,
        };
        session.ctrl_push()?;
        session.io_write(0)?;
        if !session.options.settle_delay.is_zero() {
            sleep(session.options.settle_delay);
        }

        session.io_set_direction(false)?;
        let wiring = WiringSample {
            io: session.io_sample()?,
            ctrl: session.ctrl_sample()?,
        };
        session.io_set_direction(true)?;

        session.ctrl_set(ControlPin::NRe, true);
        session.ctrl_set(ControlPin::NCe, false);
        session.ctrl_set(ControlPin::NWp, false);
        session.ctrl_push()?;

        Ok((session, wiring))
    }

    pub fn geometry(&self) -> NandGeometry {
        self.geometry
    }

    /// Last byte written to the I/O port shadow. Exposed for diagnostics and
    /// tests; the protocol itself never reads it back.
    pub fn io_shadow(&self) -> u8 {
        self.io_shadow
    }

    /// Raise nCE and leave the bus in its idle teardown state. Safe to call
    /// more than once.
    pub fn teardown(&mut self) -> Result<()> {
        self.ctrl_set(ControlPin::NCe, true);
        self.ctrl_push()
    }

    // ---------------------------------------------------------------
    // Bus abstraction (§4.1)
    // ---------------------------------------------------------------

    fn ctrl_set(&mut self, pin: ControlPin, on: bool) {
        if on {
            self.ctrl_shadow |= pin.mask();
        } else {
            self.ctrl_shadow &= !pin.mask();
        }
    }

    fn ctrl_is(&self, pin: ControlPin, on: bool) -> bool {
        (self.ctrl_shadow & pin.mask() != 0) == on
    }

    fn ctrl_push(&mut self) -> Result<()> {
        self.ctrl.write_byte(self.ctrl_shadow)
    }

    fn ctrl_sample(&mut self) -> Result<u8> {
        self.ctrl.read_pins()
    }

    fn io_write(&mut self, byte: u8) -> Result<()> {
        self.io_shadow = byte;
        self.io.write_byte(byte)
    }

    fn io_sample(&mut self) -> Result<u8> {
        self.io.read_pins()
    }

    fn io_set_direction(&mut self, output: bool) -> Result<()> {
        self.io.set_direction_mask(if output {
            IO_DIRECTION_OUTPUT
        } else {
            IO_DIRECTION_INPUT
        })
    }

    fn edge_delay(&self) {
        if self.options.edge_delay_us > 0 {
            sleep(Duration::from_micros(self.options.edge_delay_us));
        }
    }

    fn precondition(&self, ok: bool, what: &'static str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(Error::PreconditionViolated(what))
        }
    }

    // ---------------------------------------------------------------
    // Latch primitives (§4.2)
    // ---------------------------------------------------------------

    pub fn latch_command(&mut self, cmd: u8) -> Result<()> {
        self.precondition(
            self.ctrl_is(ControlPin::NCe, false),
            "latch_command requires nCE low",
        )?;
        self.precondition(
            self.ctrl_is(ControlPin::NRe, true),
            "latch_command requires nRE high",
        )?;

        self.ctrl_set(ControlPin::Cle, true);
        self.ctrl_push()?;
        self.ctrl_set(ControlPin::NWe, false);
        self.ctrl_push()?;
        self.io_write(cmd)?;
        self.ctrl_set(ControlPin::NWe, true);
        self.ctrl_push()?;
        self.ctrl_set(ControlPin::Cle, false);
        self.ctrl_push()?;
        Ok(())
    }

    fn check_address_preconditions(&self) -> Result<()> {
        self.precondition(
            self.ctrl_is(ControlPin::NCe, false),
            "latch_address requires nCE low",
        )?;
        self.precondition(
            self.ctrl_is(ControlPin::Cle, false),
            "latch_address requires CLE low",
        )?;
        self.precondition(
            self.ctrl_is(ControlPin::NRe, true),
            "latch_address requires nRE high",
        )
    }

    pub fn latch_address(&mut self, cycles: &[u8]) -> Result<()> {
        self.check_address_preconditions()?;

        self.ctrl_set(ControlPin::Ale, true);
        self.ctrl_push()?;
        for &byte in cycles {
            self.ctrl_set(ControlPin::NWe, false);
            self.ctrl_push()?;
            self.edge_delay();
            self.io_write(byte)?;
            self.edge_delay();
            self.ctrl_set(ControlPin::NWe, true);
            self.ctrl_push()?;
            self.edge_delay();
        }
        self.ctrl_set(ControlPin::Ale, false);
        self.ctrl_push()?;
        Ok(())
    }

    pub fn latch_data_in(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_address_preconditions()?;

        for &byte in bytes {
            self.ctrl_set(ControlPin::NWe, false);
            self.ctrl_push()?;
            self.edge_delay();
            self.io_write(byte)?;
            self.edge_delay();
            self.ctrl_set(ControlPin::NWe, true);
            self.ctrl_push()?;
            self.edge_delay();
        }
        Ok(())
    }

    pub fn latch_data_out(&mut self, len: usize) -> Result<Vec<u8>> {
        self.precondition(
            self.ctrl_is(ControlPin::NCe, false),
            "latch_data_out requires nCE low",
        )?;
        self.precondition(
            self.ctrl_is(ControlPin::NWe, true),
            "latch_data_out requires nWE high",
        )?;
        self.precondition(
            self.ctrl_is(ControlPin::Ale, false),
            "latch_data_out requires ALE low",
        )?;
        self.precondition(
            self.ctrl_is(ControlPin::Cle, false),
            "latch_data_out requires CLE low",
        )?;

        self.io_set_direction(false)?;
        let mut buf = vec![0u8; len];
        for slot in buf.iter_mut() {
            self.ctrl_set(ControlPin::NRe, false);
            self.ctrl_push()?;
            *slot = self.io_sample()?;
            self.ctrl_set(ControlPin::NRe, true);
            self.ctrl_push()?;
        }
        self.io_set_direction(true)?;
        Ok(buf)
    }

    pub fn wait_ready(&mut self) -> Result<()> {
        let start = Instant::now();
        loop {
            let pins = self.ctrl_sample()?;
            if pins & ControlPin::Rdy.mask() != 0 {
                return Ok(());
            }
            if let Some(timeout) = self.options.busy_timeout {
                if start.elapsed() > timeout {
                    return Err(Error::ChipBusyTimeout);
                }
            }
        }
    }

    // ---------------------------------------------------------------
    // NAND command sequences (§4.3)
    // ---------------------------------------------------------------

    pub fn read_id(&mut self) -> Result<IdRegister> {
        self.latch_command(0x90)?;
        self.latch_address(&[0x00])?;
        let bytes = self.latch_data_out(5)?;
        Ok(IdRegister([bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]]))
    }

    pub fn read_page(&mut self, page: u32) -> Result<Vec<u8>> {
        self.latch_command(0x00)?;
        self.latch_address(&pack_full_address(page, 0))?;
        self.latch_command(0x30)?;
        self.wait_ready()?;
        self.latch_data_out(self.geometry.page_size)
    }

    pub fn read_status(&mut self) -> Result<StatusRegister> {
        self.latch_command(0x70)?;
        let byte = self.latch_data_out(1)?[0];
        Ok(StatusRegister(byte))
    }

    pub fn erase_block(&mut self, block: u32) -> Result<()> {
        self.ctrl_set(ControlPin::NWp, true);
        self.ctrl_push()?;

        self.latch_command(0x60)?;
        self.latch_address(&pack_row_address(block * self.geometry.pages_per_block))?;
        self.latch_command(0xD0)?;
        self.wait_ready()?;

        self.latch_command(0x70)?;
        let status = StatusRegister(self.latch_data_out(1)?[0]);

        self.ctrl_set(ControlPin::NWp, false);
        self.ctrl_push()?;

        if status.is_fail() {
            return Err(Error::EraseFailed {
                block,
                status: status.0,
            });
        }
        Ok(())
    }

    pub fn program_page(&mut self, page: u32, buf: &[u8]) -> Result<()> {
        self.ctrl_set(ControlPin::NWp, true);
        self.ctrl_push()?;

        self.latch_command(0x80)?;
        self.latch_address(&pack_full_address(page, 0))?;
        self.latch_data_in(buf)?;
        self.latch_command(0x10)?;
        self.wait_ready()?;

        self.latch_command(0x70)?;
        let status = StatusRegister(self.latch_data_out(1)?[0]);

        self.ctrl_set(ControlPin::NWp, false);
        self.ctrl_push()?;

        if status.is_fail() {
            return Err(Error::ProgramFailed {
                page,
                status: status.0,
            });
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Operation drivers (§4.4)
    // ---------------------------------------------------------------

    /// Dump `count` pages starting at `start_page` to `sink`, flushing after
    /// every page so an interrupted dump leaves a truncated-but-valid
    /// prefix. `count == 0` means "to the end of the device".
    pub fn dump_range<W: Write>(
        &mut self,
        start_page: u32,
        count: u32,
        sink: &mut W,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<()> {
        let count = self.resolve_page_count(start_page, count);
        for i in 0..count {
            let page = start_page + i;
            let buf = self.read_page(page)?;
            sink.write_all(&buf)
                .map_err(|e| Error::SinkWriteFailed(e.to_string()))?;
            sink.flush()
                .map_err(|e| Error::SinkWriteFailed(e.to_string()))?;
            on_progress(Progress::new(u64::from(i + 1), u64::from(count)));
        }
        Ok(())
    }

    /// Program pages read from `source` starting at `start_page`, after
    /// skipping `skip_pages` whole pages at the head of the stream. Returns
    /// `(total_read, programmed, skipped)`.
    pub fn program_from_stream<R: Read + Seek>(
        &mut self,
        start_page: u32,
        count: u32,
        skip_pages: u32,
        source: &mut R,
        policy: &SkipPolicy,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<(u32, u32, u32)> {
        let page_size = self.geometry.page_size;
        source
            .seek(SeekFrom::Start(u64::from(skip_pages) * page_size as u64))
            .map_err(Error::Io)?;

        let total = self.resolve_page_count(start_page, count);
        let mut buf = vec![0u8; page_size];
        let mut read_count = 0u32;
        let mut programmed = 0u32;
        let mut skipped = 0u32;

        for i in 0..total {
            let page = start_page + i;
            if !read_full_page_or_stop(source, &mut buf, page)? {
                break;
            }
            read_count += 1;

            if policy.should_skip(&buf) {
                skipped += 1;
            } else {
                self.program_page(page, &buf)?;
                programmed += 1;
            }
            on_progress(Progress::new(u64::from(i + 1), u64::from(total)));
        }

        Ok((read_count, programmed, skipped))
    }

    /// Erase `count` blocks starting at `start_block`. `count == 0` means
    /// "to the end of the device".
    pub fn erase_range(
        &mut self,
        start_block: u32,
        count: u32,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<()> {
        let total_blocks = self.geometry.total_blocks();
        let count = if count == 0 {
            total_blocks - start_block
        } else {
            count
        };
        for i in 0..count {
            let block = start_block + i;
            self.erase_block(block)?;
            on_progress(Progress::new(u64::from(i + 1), u64::from(count)));
        }
        Ok(())
    }

    fn resolve_page_count(&self, start_page: u32, count: u32) -> u32 {
        if count == 0 {
            self.geometry.total_pages - start_page
        } else {
            count
        }
    }
}

impl<IO: GpioPort, CTRL: GpioPort> Drop for NandSession<IO, CTRL> {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}

/// One-time post-bring-up wiring sanity sample (step 3 of the orchestrator).
#[derive(Debug, Clone, Copy)]
pub struct WiringSample {
    pub io: u8,
    pub ctrl: u8,
}

/// Reads exactly `buf.len()` bytes, or stops at a clean end-of-stream. A
/// clean stop is zero bytes available right at the page boundary; anything
/// in between is a truncated page and a hard error.
fn read_full_page_or_stop<R: Read>(source: &mut R, buf: &mut [u8], page: u32) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..]).map_err(Error::Io)?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled == 0 {
        Ok(false)
    } else if filled < buf.len() {
        Err(Error::SourceShort { page })
    } else {
        Ok(true)
    }
}
