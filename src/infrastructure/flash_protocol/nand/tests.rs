//! Protocol-level property and end-to-end tests.
//!
//! Wire-trace properties (command framing, address packing on the wire,
//! write-protect discipline, ready-wait gating, status gating) are checked
//! against [`MockGpioPort`], which records every byte pushed to a port in
//! call order. Behavioral properties (round-trip, dump idempotence, skip
//! policy) run against [`SimulatedNandChip`], which actually interprets the
//! latch sequence the way a part would.

use super::*;
use crate::domain::{pack_row_address, NandGeometry, SkipPolicy};
use crate::infrastructure::gpio::{MockGpioPort, SimulatedNandChip};
use std::io::Cursor;

const NO_DELAY: NandSessionOptions = NandSessionOptions {
    edge_delay_us: 0,
    busy_timeout: None,
    settle_delay: Duration::from_millis(0),
};

/// Build a session already sitting in the idle bus state (nCE low, nRE high,
/// nWP low, ALE/CLE low) without running the real bring-up handshake, so
/// wire-trace tests can assert on exactly the bytes a single call produces.
fn idle_session(io: MockGpioPort, ctrl: MockGpioPort) -> NandSession<MockGpioPort, MockGpioPort> {
    let mut ctrl_shadow = 0u8;
    ctrl_shadow |= ControlPin::NRe.mask();
    NandSession {
        io,
        ctrl,
        io_shadow: 0,
        ctrl_shadow,
        geometry: NandGeometry::default(),
        options: NO_DELAY,
    }
}

fn small_geometry() -> NandGeometry {
    // A tiny geometry keeps test buffers readable; the protocol makes no
    // assumption about page/block size beyond what NandGeometry reports.
    NandGeometry {
        page_size: 16,
        pages_per_block: 4,
        total_pages: 64,
    }
}

// ---------------------------------------------------------------
// Property 1: command framing
// ---------------------------------------------------------------

#[test]
fn latch_command_emits_exactly_the_cle_we_frame() {
    let io = MockGpioPort::new("io");
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);

    session.latch_command(0xAA).unwrap();

    assert_eq!(session.io.writes(), vec![0xAA]);
    assert_eq!(session.ctrl.writes(), vec![0x11, 0x11, 0x19, 0x18]);
}

#[test]
fn latch_command_never_disturbs_nce_nre_nwp_ale() {
    let io = MockGpioPort::new("io");
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);
    let invariant_mask =
        ControlPin::NCe.mask() | ControlPin::NRe.mask() | ControlPin::NWp.mask() | ControlPin::Ale.mask();
    let before = session.ctrl_shadow & invariant_mask;

    session.latch_command(0x00).unwrap();

    for byte in session.ctrl.writes() {
        assert_eq!(byte & invariant_mask, before);
    }
}

#[test]
fn latch_command_rejects_nce_high() {
    let io = MockGpioPort::new("io");
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);
    session.ctrl_set(ControlPin::NCe, true);

    let err = session.latch_command(0x90).unwrap_err();
    assert!(matches!(err, Error::PreconditionViolated(_)));
}

// ---------------------------------------------------------------
// Property 2: address cycles land on the I/O port in packed order
// ---------------------------------------------------------------

#[test]
fn latch_address_emits_cycles_on_the_io_port_in_order() {
    let io = MockGpioPort::new("io");
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);
    let cycles = pack_full_address(0x01A2B3, 0x0010);

    session.latch_address(&cycles).unwrap();

    assert_eq!(session.io.writes(), cycles.to_vec());
}

// ---------------------------------------------------------------
// Property 3: erase uses the row-only address, never the full cycle count
// ---------------------------------------------------------------

#[test]
fn erase_block_latches_three_row_cycles_not_five() {
    let io = MockGpioPort::new("io");
    io.expect_read(0x00); // status: success
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);
    session.geometry = small_geometry();

    session.erase_block(5).unwrap();

    let writes = session.io.writes();
    // [0x60, row0, row1, row2, 0xD0, 0x70]
    assert_eq!(writes.len(), 6);
    assert_eq!(writes[0], 0x60);
    assert_eq!(&writes[1..4], &pack_row_address(5 * 4));
    assert_eq!(writes[4], 0xD0);
    assert_eq!(writes[5], 0x70);
}

// ---------------------------------------------------------------
// Property 4: write-protect discipline
// ---------------------------------------------------------------

#[test]
fn program_page_brackets_nwp_around_the_whole_sequence() {
    let io = MockGpioPort::new("io");
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);
    session.geometry = small_geometry();

    session.program_page(0, &[0xAAu8; 16]).unwrap();

    let nwp_trace: Vec<bool> = session
        .ctrl
        .writes()
        .into_iter()
        .map(|b| b & ControlPin::NWp.mask() != 0)
        .collect();
    assert_eq!(*nwp_trace.first().unwrap(), true);
    assert_eq!(*nwp_trace.last().unwrap(), false);
    // Exactly one rising and one falling edge across the whole sequence.
    let rises = nwp_trace.windows(2).filter(|w| !w[0] && w[1]).count();
    let falls = nwp_trace.windows(2).filter(|w| w[0] && !w[1]).count();
    assert_eq!(rises, 0, "nWP should already be high by the first write");
    assert_eq!(falls, 1);
}

#[test]
fn read_id_never_touches_nwp() {
    let io = MockGpioPort::new("io");
    let ctrl = MockGpioPort::new("ctrl");
    io.expect_read(0xAD);
    io.expect_read(0xDC);
    io.expect_read(0x10);
    io.expect_read(0x95);
    io.expect_read(0x54);
    let mut session = idle_session(io, ctrl);

    session.read_id().unwrap();

    assert!(session
        .ctrl
        .writes()
        .into_iter()
        .all(|b| b & ControlPin::NWp.mask() == 0));
}

// ---------------------------------------------------------------
// Property 5: ready-wait gating
// ---------------------------------------------------------------

#[test]
fn wait_ready_polls_until_rdy_asserted() {
    let ctrl = MockGpioPort::new("ctrl");
    ctrl.expect_read(0x00); // busy
    ctrl.expect_read(0x00); // busy
    ctrl.expect_read(ControlPin::Rdy.mask()); // ready
    let io = MockGpioPort::new("io");
    let mut session = idle_session(io, ctrl);

    session.wait_ready().unwrap();

    assert_eq!(session.ctrl.reads_served(), 3);
}

#[test]
fn wait_ready_times_out_when_bounded() {
    let ctrl = MockGpioPort::new("ctrl");
    ctrl.expect_reads_repeating(0x00, 50);
    let io = MockGpioPort::new("io");
    let mut session = idle_session(io, ctrl);
    session.options.busy_timeout = Some(Duration::from_millis(0));

    let err = session.wait_ready().unwrap_err();
    assert!(matches!(err, Error::ChipBusyTimeout));
}

// ---------------------------------------------------------------
// Property 6: status gating
// ---------------------------------------------------------------

#[test]
fn program_page_reports_program_failed_on_status_bit_zero_set() {
    let io = MockGpioPort::new("io");
    io.expect_read(0x01); // status: fail
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);
    session.geometry = small_geometry();

    let err = session.program_page(3, &[0x11u8; 16]).unwrap_err();
    assert!(matches!(
        err,
        Error::ProgramFailed { page: 3, status: 0x01 }
    ));
}

#[test]
fn erase_block_reports_erase_failed_on_status_bit_zero_set() {
    let io = MockGpioPort::new("io");
    io.expect_read(0x01);
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);
    session.geometry = small_geometry();

    let err = session.erase_block(1).unwrap_err();
    assert!(matches!(err, Error::EraseFailed { block: 1, status: 0x01 }));
}

// ---------------------------------------------------------------
// Property 7: round trip through a simulated chip
// ---------------------------------------------------------------

#[test]
fn program_then_read_round_trips_through_a_simulated_chip() {
    let chip = SimulatedNandChip::new(small_geometry());
    let (io, ctrl) = chip.ports();
    let (mut session, _wiring) =
        NandSession::bring_up(io, ctrl, small_geometry(), NO_DELAY).unwrap();

    let pattern = vec![0x5Au8; 16];
    session.program_page(10, &pattern).unwrap();
    let read_back = session.read_page(10).unwrap();

    assert_eq!(read_back, pattern);
}

#[test]
fn erase_resets_a_block_to_all_ff() {
    let chip = SimulatedNandChip::new(small_geometry());
    chip.preload_page(4, &[0x00u8; 16]);
    let (io, ctrl) = chip.ports();
    let (mut session, _wiring) =
        NandSession::bring_up(io, ctrl, small_geometry(), NO_DELAY).unwrap();

    session.erase_block(1).unwrap(); // block 1 covers pages 4..8

    assert_eq!(session.read_page(4).unwrap(), vec![0xFFu8; 16]);
}

// ---------------------------------------------------------------
// Property 8: dump idempotence
// ---------------------------------------------------------------

#[test]
fn dumping_the_same_range_twice_yields_identical_bytes() {
    let chip = SimulatedNandChip::new(small_geometry());
    for page in 0..4u32 {
        chip.preload_page(page, &vec![page as u8; 16]);
    }

    let (io1, ctrl1) = chip.ports();
    let (mut session1, _) = NandSession::bring_up(io1, ctrl1, small_geometry(), NO_DELAY).unwrap();
    let mut first = Vec::new();
    session1.dump_range(0, 4, &mut first, |_| {}).unwrap();
    drop(session1);

    let (io2, ctrl2) = chip.ports();
    let (mut session2, _) = NandSession::bring_up(io2, ctrl2, small_geometry(), NO_DELAY).unwrap();
    let mut second = Vec::new();
    session2.dump_range(0, 4, &mut second, |_| {}).unwrap();

    assert_eq!(first, second);
}

// ---------------------------------------------------------------
// Property 9: program-time skip policy
// ---------------------------------------------------------------

#[test]
fn program_from_stream_skips_blank_and_zero_pages_by_default() {
    let chip = SimulatedNandChip::new(small_geometry());
    let (io, ctrl) = chip.ports();
    let (mut session, _) = NandSession::bring_up(io, ctrl, small_geometry(), NO_DELAY).unwrap();

    let mut source = Vec::new();
    source.extend(vec![0xFFu8; 16]); // page 0: blank, skipped
    source.extend(vec![0x7Au8; 16]); // page 1: real data, programmed
    source.extend(vec![0x00u8; 16]); // page 2: suspected bad block, skipped
    let mut cursor = Cursor::new(source);

    let (read, programmed, skipped) = session
        .program_from_stream(0, 3, 0, &mut cursor, &SkipPolicy::default(), |_| {})
        .unwrap();

    assert_eq!((read, programmed, skipped), (3, 1, 2));
    assert_eq!(session.read_page(1).unwrap(), vec![0x7Au8; 16]);
}

#[test]
fn skip_blank_only_policy_programs_all_zero_pages() {
    let chip = SimulatedNandChip::new(small_geometry());
    let (io, ctrl) = chip.ports();
    let (mut session, _) = NandSession::bring_up(io, ctrl, small_geometry(), NO_DELAY).unwrap();

    let mut source = Vec::new();
    source.extend(vec![0x00u8; 16]);
    let mut cursor = Cursor::new(source);

    let (read, programmed, skipped) = session
        .program_from_stream(0, 1, 0, &mut cursor, &SkipPolicy::SkipBlankOnly, |_| {})
        .unwrap();

    assert_eq!((read, programmed, skipped), (1, 1, 0));
    assert_eq!(session.read_page(0).unwrap(), vec![0x00u8; 16]);
}

// ---------------------------------------------------------------
// Concrete end-to-end scenarios
// ---------------------------------------------------------------

/// E1: bring-up reports a matching identity and a success status.
#[test]
fn e1_bring_up_then_read_id_and_status_succeed() {
    let chip = SimulatedNandChip::new(small_geometry());
    let (io, ctrl) = chip.ports();
    let (mut session, wiring) =
        NandSession::bring_up(io, ctrl, small_geometry(), NO_DELAY).unwrap();

    assert_eq!(wiring.ctrl & ControlPin::Rdy.mask(), ControlPin::Rdy.mask());

    let id = session.read_id().unwrap();
    assert!(id.matches_expected());

    let status = session.read_status().unwrap();
    assert!(status.is_success());
}

/// E2: dumping a known range reproduces each page's preloaded content.
#[test]
fn e2_dump_range_reproduces_preloaded_pages() {
    let chip = SimulatedNandChip::new(small_geometry());
    chip.preload_page(10, &[0x0Au8; 16]);
    chip.preload_page(11, &[0x0Bu8; 16]);
    let (io, ctrl) = chip.ports();
    let (mut session, _) = NandSession::bring_up(io, ctrl, small_geometry(), NO_DELAY).unwrap();

    let mut sink = Vec::new();
    session.dump_range(10, 2, &mut sink, |_| {}).unwrap();

    let mut expected = vec![0x0Au8; 16];
    expected.extend(vec![0x0Bu8; 16]);
    assert_eq!(sink, expected);
}

/// E3: erasing a range of blocks latches the row address of each block's
/// first page, not the full 5-cycle address.
#[test]
fn e3_erase_range_latches_each_blocks_row_address() {
    let io = MockGpioPort::new("io");
    let ctrl = MockGpioPort::new("ctrl");
    let mut session = idle_session(io, ctrl);
    session.geometry = small_geometry();

    session.erase_range(5, 3, |_| {}).unwrap();

    let writes = session.io.writes();
    assert_eq!(writes.len(), 18); // 3 blocks * 6 bytes each
    assert_eq!(&writes[1..4], &pack_row_address(5 * 4));
    assert_eq!(&writes[7..10], &pack_row_address(6 * 4));
    assert_eq!(&writes[13..16], &pack_row_address(7 * 4));
}

/// E4: a skip-page head offset plus the default skip policy together select
/// exactly the pages with real content.
#[test]
fn e4_program_from_stream_honors_head_skip_and_policy_together() {
    let chip = SimulatedNandChip::new(small_geometry());
    let (io, ctrl) = chip.ports();
    let (mut session, _) = NandSession::bring_up(io, ctrl, small_geometry(), NO_DELAY).unwrap();

    let mut source = Vec::new();
    source.extend(vec![0xFFu8; 16]); // skipped by skip_pages, never read
    source.extend(vec![0xFFu8; 16]); // blank, skipped by policy
    source.extend(vec![0x7Cu8; 16]); // real data, programmed
    source.extend(vec![0x00u8; 16]); // suspected bad block, skipped by policy
    let mut cursor = Cursor::new(source);

    let (read, programmed, skipped) = session
        .program_from_stream(100, 3, 1, &mut cursor, &SkipPolicy::default(), |_| {})
        .unwrap();

    assert_eq!((read, programmed, skipped), (3, 1, 2));
    assert_eq!(session.read_page(101).unwrap(), vec![0x7Cu8; 16]);
}

/// E5: a failed program status aborts the driver before the next page, and
/// the page after the failure is left untouched.
#[test]
fn e5_a_failed_program_status_aborts_the_remaining_pages() {
    let chip = SimulatedNandChip::new(small_geometry());
    chip.force_next_status_fail(true);
    let (io, ctrl) = chip.ports();
    let (mut session, _) = NandSession::bring_up(io, ctrl, small_geometry(), NO_DELAY).unwrap();

    let mut source = Vec::new();
    source.extend(vec![0x11u8; 16]);
    source.extend(vec![0x22u8; 16]);
    let mut cursor = Cursor::new(source);

    let err = session
        .program_from_stream(42, 2, 0, &mut cursor, &SkipPolicy::SkipBlankOnly, |_| {})
        .unwrap_err();

    assert!(matches!(err, Error::ProgramFailed { page: 42, .. }));
    assert_eq!(session.read_page(43).unwrap(), vec![0xFFu8; 16]);
}

/// E6 (argument-level conflicts) is exercised by the CLI layer's own tests,
/// not here: this module only covers the protocol engine.
