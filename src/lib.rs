//! nander-rs library
//!
//! A host-side programmer for a raw parallel NAND device, driven through a
//! dual-channel USB bridge operating in asynchronous bit-bang mode.
//!
//! # Architecture
//!
//! - [`domain`]: protocol-level types and constants (pins, addressing,
//!   geometry, status/identity registers, skip policy). No I/O.
//! - [`infrastructure`]: the GPIO transports (real FTDI bridge, simulated
//!   chip, mock test double) and the NAND command-protocol engine built on
//!   top of them.
//! - [`application`]: use cases wrapping the protocol engine's operation
//!   drivers with progress reporting.
//! - [`presentation`]: the CLI argument surface and dispatch.
//! - [`error`]: the crate-wide error type.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

pub use error::{Error, Result};
