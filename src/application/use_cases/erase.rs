//! Erase-range use case.

use crate::domain::Progress;
use crate::error::Result;
use crate::infrastructure::flash_protocol::nand::NandSession;
use crate::infrastructure::gpio::GpioPort;

pub struct EraseUseCase;

impl EraseUseCase {
    /// Erase `count` blocks starting at `start_block`. `count == 0` means
    /// "to the end of the device".
    pub fn execute<IO: GpioPort, CTRL: GpioPort>(
        session: &mut NandSession<IO, CTRL>,
        start_block: u32,
        count: u32,
        on_progress: impl FnMut(Progress),
    ) -> Result<()> {
        session.erase_range(start_block, count, on_progress)
    }
}
