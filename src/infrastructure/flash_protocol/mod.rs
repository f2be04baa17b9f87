//! Protocol engines built on the GPIO transport.
//!
//! A single engine lives here: the parallel NAND command-protocol layer.
//! The module is kept (rather than flattened into `infrastructure`) so a
//! second protocol family could sit alongside it without disturbing the
//! transport layer, matching the shape of this stack's infrastructure tree.

pub mod nand;
