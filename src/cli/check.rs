use std::{path::PathBuf, process};

use anyhow::Context;
use clap::Parser;
use iar::{storage, Register};
use tracing::instrument;

use super::{print_rejected, terminal::Colorize};

/// Command arguments for `iar check`.
#[derive(Debug, Parser)]
#[command(about = "Check that a CSV file would import cleanly")]
pub struct Check {
    /// The file to check
    file: PathBuf,

    /// Print nothing; report through the exit status only
    #[arg(long, short)]
    quiet: bool,
}

impl Check {
    /// Decodes and validates the file without writing anything.
    ///
    /// Exits with status 2 if any row would be skipped on import.
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let rows = storage::read_rows(&self.file)
            .with_context(|| format!("{} cannot be imported", self.file.display()))?;
        let total = rows.len();

        let mut register = Register::new();
        let report = register.bulk_load(rows);

        if !self.quiet {
            if report.is_clean() {
                println!(
                    "{}",
                    format!("✓ all {total} rows are valid assets").success()
                );
            } else {
                print_rejected(&report.rejected);
                println!(
                    "{} of {total} rows would be skipped",
                    report.rejected.len()
                );
            }
        }

        if !report.is_clean() {
            process::exit(2);
        }
        Ok(())
    }
}
