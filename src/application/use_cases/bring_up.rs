//! Orchestrator bring-up (spec §4.5 steps 1-5).
//!
//! Acquires the session, takes the wiring sanity sample, and checks the
//! chip's identity against the expected signature. Identity mismatch is
//! reported on the returned [`BringUpReport`] rather than as an `Err`: the
//! caller decides whether to continue, matching the reference tool's
//! "report and carry on" behavior.

use crate::domain::{IdRegister, NandGeometry, EXPECTED_ID};
use crate::error::Result;
use crate::infrastructure::flash_protocol::nand::{NandSession, NandSessionOptions, WiringSample};
use crate::infrastructure::gpio::GpioPort;

/// Outcome of the bring-up sequence, for the presentation layer to render.
pub struct BringUpReport {
    pub wiring: WiringSample,
    pub identity: IdRegister,
    pub identity_ok: bool,
}

pub struct BringUpUseCase;

impl BringUpUseCase {
    /// Run steps 1-5 of the orchestrator: acquire ports, settle, sample
    /// wiring, idle the bus, then READ_ID and compare.
    pub fn execute<IO: GpioPort, CTRL: GpioPort>(
        io: IO,
        ctrl: CTRL,
        geometry: NandGeometry,
        options: NandSessionOptions,
    ) -> Result<(NandSession<IO, CTRL>, BringUpReport)> {
        let (mut session, wiring) = NandSession::bring_up(io, ctrl, geometry, options)?;
        let identity = session.read_id()?;
        let report = BringUpReport {
            wiring,
            identity,
            identity_ok: identity.matches_expected(),
        };
        Ok((session, report))
    }
}
