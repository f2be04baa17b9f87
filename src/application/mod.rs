//! Application Layer
//!
//! Wraps the protocol engine's operation drivers in use-case types that add
//! progress reporting and own nothing beyond the session they're handed.
//! Contains no GPIO or file I/O of its own: everything here delegates to
//! [`crate::infrastructure::flash_protocol::nand::NandSession`].

pub mod use_cases;

pub use use_cases::{BringUpUseCase, BringUpReport, DumpUseCase, EraseUseCase, ProgramUseCase, SelfTestUseCase};
