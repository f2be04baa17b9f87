//! CLI dispatch: validates arguments, opens the real GPIO transport, and
//! drives exactly one of the application layer's use cases.

pub mod args;

use std::fs::{File, OpenOptions};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::application::{BringUpReport, BringUpUseCase, DumpUseCase, EraseUseCase, ProgramUseCase};
use crate::application::use_cases::SelfTestUseCase;
use crate::domain::{NandGeometry, Progress, SkipPolicy};
use crate::error::{Error, Result};
use crate::infrastructure::flash_protocol::nand::{NandSession, NandSessionOptions};
use crate::infrastructure::gpio::{FtdiBitbangPort, FtdiChannel};

pub use args::{Action, Args};

/// Execute the action selected by `args`. Argument validation and the
/// dump-file-exists check both run before any GPIO port is touched, per
/// spec §6/§7.
pub fn execute(args: Args) -> Result<()> {
    let action = args.action().map_err(Error::ArgumentError)?;

    if action == Action::Dump && args.file.exists() && !args.overwrite {
        return Err(Error::OutputFileExists(args.file.display().to_string()));
    }

    let options = NandSessionOptions {
        edge_delay_us: args.delay_us,
        ..Default::default()
    };

    if action == Action::SelfTest {
        return run_self_test(options.edge_delay_us);
    }

    let device = crate::infrastructure::gpio::ftdi::find_device()?;
    let io = FtdiBitbangPort::open(&device, FtdiChannel::A, crate::domain::IO_DIRECTION_OUTPUT, "io")?;
    let ctrl = FtdiBitbangPort::open(&device, FtdiChannel::B, crate::domain::CTRL_DIRECTION_MASK, "ctrl")?;

    let geometry = NandGeometry::default();
    let (mut session, report) = BringUpUseCase::execute(io, ctrl, geometry, options)?;
    report_bring_up(&report);

    let result = match action {
        Action::Dump => run_dump(&mut session, &args),
        Action::Program => run_program(&mut session, &args),
        Action::Erase => run_erase(&mut session, &args),
        Action::SelfTest => unreachable!("handled above"),
    };

    // The orchestrator always tears down to the idle control-bus state
    // before returning, regardless of which branch above failed; this
    // happens in `NandSession`'s `Drop` impl when `session` goes out of
    // scope here.
    result
}

fn report_bring_up(report: &BringUpReport) {
    info!(
        "wiring sample: io=0x{:02X} ctrl=0x{:02X}",
        report.wiring.io, report.wiring.ctrl
    );
    if report.identity_ok {
        println!("{} identity {}", "PASS".green().bold(), report.identity);
    } else {
        println!(
            "{} identity {} (expected {})",
            "FAIL".red().bold(),
            report.identity,
            crate::domain::IdRegister(crate::domain::EXPECTED_ID)
        );
        warn!("chip identity did not match the expected signature; continuing anyway");
    }
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

fn run_dump<IO, CTRL>(session: &mut NandSession<IO, CTRL>, args: &Args) -> Result<()>
where
    IO: crate::infrastructure::gpio::GpioPort,
    CTRL: crate::infrastructure::gpio::GpioPort,
{
    let mut sink = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&args.file)
        .map_err(Error::Io)?;

    let total = if args.count == 0 {
        u64::from(session.geometry().total_pages - args.start_page)
    } else {
        u64::from(args.count)
    };
    let bar = progress_bar(total);

    DumpUseCase::execute(session, args.start_page, args.count, &mut sink, |p: Progress| {
        bar.set_position(p.current);
    })?;
    bar.finish_with_message("dump complete");
    println!("{} dumped to {}", "done:".green(), args.file.display());
    Ok(())
}

fn run_program<IO, CTRL>(session: &mut NandSession<IO, CTRL>, args: &Args) -> Result<()>
where
    IO: crate::infrastructure::gpio::GpioPort,
    CTRL: crate::infrastructure::gpio::GpioPort,
{
    let path = args.program.as_ref().expect("Action::Program implies -p");
    let mut source = File::open(path).map_err(Error::Io)?;

    let total = if args.count == 0 {
        u64::from(session.geometry().total_pages - args.start_page)
    } else {
        u64::from(args.count)
    };
    let bar = progress_bar(total);

    let (read, programmed, skipped) = ProgramUseCase::execute(
        session,
        args.start_page,
        args.count,
        args.skip_pages,
        &mut source,
        &SkipPolicy::default(),
        |p: Progress| bar.set_position(p.current),
    )?;
    bar.finish_with_message("program complete");
    println!(
        "{} read={read} programmed={programmed} skipped={skipped}",
        "done:".green()
    );
    Ok(())
}

fn run_erase<IO, CTRL>(session: &mut NandSession<IO, CTRL>, args: &Args) -> Result<()>
where
    IO: crate::infrastructure::gpio::GpioPort,
    CTRL: crate::infrastructure::gpio::GpioPort,
{
    let total = if args.count == 0 {
        u64::from(session.geometry().total_blocks() - args.start_block)
    } else {
        u64::from(args.count)
    };
    let bar = progress_bar(total);

    EraseUseCase::execute(session, args.start_block, args.count, |p: Progress| {
        bar.set_position(p.current);
    })?;
    bar.finish_with_message("erase complete");
    println!("{} erase complete", "done:".green());
    Ok(())
}

fn run_self_test(edge_delay_us: u64) -> Result<()> {
    println!("{}", "self-test mode: DISCONNECT THE FLASH".yellow().bold());
    let device = crate::infrastructure::gpio::ftdi::find_device()?;
    let mut io = FtdiBitbangPort::open(&device, FtdiChannel::A, crate::domain::IO_DIRECTION_OUTPUT, "io")?;
    let mut ctrl = FtdiBitbangPort::open(&device, FtdiChannel::B, crate::domain::CTRL_DIRECTION_MASK, "ctrl")?;

    let delay = if edge_delay_us == 0 {
        Duration::from_secs(1)
    } else {
        Duration::from_micros(edge_delay_us)
    };

    SelfTestUseCase::execute(&mut io, &mut ctrl, delay, |step| {
        println!("toggling {} bus pin {}", step.bus, step.pin);
    })?;
    println!("{} self-test complete", "done:".green());
    Ok(())
}
