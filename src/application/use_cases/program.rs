//! Program-from-stream use case.

use std::io::{Read, Seek};

use crate::domain::{Progress, SkipPolicy};
use crate::error::Result;
use crate::infrastructure::flash_protocol::nand::NandSession;
use crate::infrastructure::gpio::GpioPort;

pub struct ProgramUseCase;

impl ProgramUseCase {
    /// Program pages read from `source`, after skipping `skip_pages` whole
    /// pages at its head. Returns `(total_read, programmed, skipped)`.
    #[allow(clippy::too_many_arguments)]
    pub fn execute<IO: GpioPort, CTRL: GpioPort, R: Read + Seek>(
        session: &mut NandSession<IO, CTRL>,
        start_page: u32,
        count: u32,
        skip_pages: u32,
        source: &mut R,
        policy: &SkipPolicy,
        on_progress: impl FnMut(Progress),
    ) -> Result<(u32, u32, u32)> {
        session.program_from_stream(start_page, count, skip_pages, source, policy, on_progress)
    }
}
