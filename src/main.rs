//! nander - a host-side programmer for a raw parallel NAND device
//!
//! This is the main entry point for the CLI application.

use std::process::ExitCode;

use clap::Parser;
use log::info;

use nander_rs::error::Error;
use nander_rs::presentation::cli::{self, Args};

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    info!("nander v{}", env!("CARGO_PKG_VERSION"));

    match cli::execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            exit_code_for(&err)
        }
    }
}

/// Exit codes per spec §6: 0 success, 1 argument error, 2 dump file already
/// exists without `-o`, nonzero (3) for any other hardware/transport failure.
fn exit_code_for(err: &Error) -> ExitCode {
    match err {
        Error::ArgumentError(_) => ExitCode::from(1),
        Error::OutputFileExists(_) => ExitCode::from(2),
        _ => ExitCode::from(3),
    }
}
