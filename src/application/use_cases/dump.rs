//! Dump-range use case.

use std::io::Write;

use crate::domain::Progress;
use crate::error::Result;
use crate::infrastructure::flash_protocol::nand::NandSession;
use crate::infrastructure::gpio::GpioPort;

pub struct DumpUseCase;

impl DumpUseCase {
    /// Dump `count` pages starting at `start_page` into `sink`. `count == 0`
    /// means "to the end of the device".
    pub fn execute<IO: GpioPort, CTRL: GpioPort, W: Write>(
        session: &mut NandSession<IO, CTRL>,
        start_page: u32,
        count: u32,
        sink: &mut W,
        on_progress: impl FnMut(Progress),
    ) -> Result<()> {
        session.dump_range(start_page, count, sink, on_progress)
    }
}
