//! `iar` compiles an information asset register from the command line.
//!
//! Assets are validated against the register schema as they are added or
//! imported, and the register is kept as a CSV file that opens in any
//! spreadsheet.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
