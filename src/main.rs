//! # Datasight command line
//!
//! ```bash
//! datasight analyze sales.csv --json results.json --report report.md
//! datasight ask sales.csv "what is the maximum unit_price?"
//! ```
//!
//! Logs go to the console and to a daily rolling file. Set `RUST_LOG` to
//! change the level, e.g. `RUST_LOG=datasight=debug`.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // CLI output goes to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;
use datasight::logging::{self, LogOptions};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let _guard = logging::init(LogOptions {
        file_logging: !cli.no_log_file,
        log_dir: cli.log_dir,
        ..LogOptions::default()
    })?;

    cli::run_command(cli.command)
}
