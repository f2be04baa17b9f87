//! Error types for nander-rs
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nander-rs
#[derive(Error, Debug)]
pub enum Error {
    /// USB communication error
    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    /// USB transfer error (raw bulk/control transfer failure)
    #[error("USB transfer error: {0}")]
    Transfer(#[from] nusb::transfer::TransferError),

    /// No FTDI-class bridge device found on the bus
    #[error("GPIO bridge not found. Is the FT2232H-class device connected?")]
    TransportNotFound,

    /// A latch primitive was invoked with the control bus in the wrong state.
    #[error("protocol precondition violated: {0}")]
    PreconditionViolated(&'static str),

    /// A GPIO read or write to the transport failed.
    #[error("GPIO transport failed: {0}")]
    TransportFailed(String),

    /// RDY never asserted within the configured bound.
    #[error("chip did not assert ready within the timeout")]
    ChipBusyTimeout,

    /// Program operation failed: status register bit 0 was set.
    #[error("program failed at page {page}: status = 0x{status:02X}")]
    ProgramFailed { page: u32, status: u8 },

    /// Erase operation failed: status register bit 0 was set.
    #[error("erase failed at block {block}: status = 0x{status:02X}")]
    EraseFailed { block: u32, status: u8 },

    /// The program source ran out of data before the requested page/byte count.
    #[error("program source ended early at page {page}")]
    SourceShort { page: u32 },

    /// Writing to the dump sink failed.
    #[error("failed writing to dump sink: {0}")]
    SinkWriteFailed(String),

    /// READ_ID did not match the expected signature. Non-fatal: reported to
    /// the caller, who decides whether to continue.
    #[error("identity mismatch: expected {expected}, got {actual}")]
    IdentityMismatch {
        expected: crate::domain::IdRegister,
        actual: crate::domain::IdRegister,
    },

    /// Invalid combination or value of CLI flags.
    #[error("argument error: {0}")]
    ArgumentError(String),

    /// Requested output file already exists and `-o` was not given.
    #[error("output file already exists: {0}")]
    OutputFileExists(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
