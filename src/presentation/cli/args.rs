//! Flat CLI argument surface (spec §6): exactly one primary action per
//! invocation, selected by which flags are present, not by a subcommand.

use std::path::PathBuf;

use clap::Parser;

/// nander — a host-side programmer for a raw parallel NAND device over a
/// dual-channel USB bit-bang bridge.
#[derive(Parser, Debug)]
#[command(name = "nander")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Start page, for dump and program.
    #[arg(short = 's', long = "start-page", default_value_t = 0)]
    pub start_page: u32,

    /// Count: pages for dump/program, blocks for erase. 0 means "to end".
    #[arg(short = 'c', long = "count", default_value_t = 0)]
    pub count: u32,

    /// Per-nWE/nRE microsecond delay.
    #[arg(short = 'd', long = "delay", default_value_t = 0)]
    pub delay_us: u64,

    /// Output file path for dump.
    #[arg(short = 'f', long = "file", default_value = "flashdump.bin")]
    pub file: PathBuf,

    /// Permit overwriting an existing dump file.
    #[arg(short = 'o', long = "overwrite")]
    pub overwrite: bool,

    /// Program mode: source file path.
    #[arg(short = 'p', long = "program")]
    pub program: Option<PathBuf>,

    /// Page skip at the head of the program source.
    #[arg(short = 'k', long = "skip", default_value_t = 0)]
    pub skip_pages: u32,

    /// Erase mode.
    #[arg(short = 'E', long = "erase")]
    pub erase: bool,

    /// Start block, erase mode only.
    #[arg(short = 'b', long = "start-block", default_value_t = 0)]
    pub start_block: u32,

    /// Self-test mode: toggle every control and I/O pin, chip disconnected.
    #[arg(short = 't', long = "self-test")]
    pub self_test: bool,

    /// Raise logging verbosity.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// The single primary action selected by the CLI flags (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Dump,
    Program,
    Erase,
    SelfTest,
}

impl Args {
    /// Decide which action is selected, validating the flag combinations
    /// the spec calls out before any GPIO port is acquired.
    pub fn action(&self) -> Result<Action, String> {
        if self.start_page != 0 && self.start_block != 0 {
            return Err("-s (start page) cannot be combined with -b (start block)".to_string());
        }
        if self.start_page != 0 && self.erase {
            return Err("-s (start page) cannot be combined with -E (erase)".to_string());
        }

        if self.self_test {
            Ok(Action::SelfTest)
        } else if self.program.is_some() {
            Ok(Action::Program)
        } else if self.erase {
            Ok(Action::Erase)
        } else {
            Ok(Action::Dump)
        }
    }
}
