//! Use cases
//!
//! One type per top-level action: bring-up/identity check, dump, program,
//! erase, and the hardware-free self-test. Each is generic over the GPIO
//! transport so the same use case drives either the real FTDI bridge or the
//! in-process simulated chip.

mod bring_up;
mod dump;
mod erase;
mod program;

pub use bring_up::{BringUpReport, BringUpUseCase};
pub use dump::DumpUseCase;
pub use erase::EraseUseCase;
pub use program::ProgramUseCase;
pub use self_test::SelfTestUseCase;
