use std::{fmt, path::PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use iar::{storage, AssetRecord, Field, RegisterFile, Schema};
use serde_json::{Map, Value};
use tracing::instrument;

use super::terminal::{is_narrow, Colorize};

/// Command arguments for `iar list`.
#[derive(Debug, Parser)]
#[command(about = "Show the assets in a register")]
pub struct List {
    /// The register file
    register: PathBuf,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Show every column instead of a summary.
    #[arg(long)]
    all: bool,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,
}

/// Supported output formats.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let file = RegisterFile::open(self.register.clone())
            .with_context(|| format!("failed to open {}", self.register.display()))?;
        let records = file.register().snapshot();

        match self.output {
            OutputFormat::Table => {
                if records.is_empty() && !self.quiet {
                    println!("No assets yet. Add one with 'iar add'.");
                    return Ok(());
                }
                let columns = summary_columns(self.all);
                render_table(records, &columns, self.quiet);
            }
            OutputFormat::Json => render_json(records)?,
            OutputFormat::Csv => print!("{}", storage::encode(records)),
        }
        Ok(())
    }
}

/// The columns shown in a table.
///
/// Narrow terminals get only the identifying columns.
pub fn summary_columns(all: bool) -> Vec<Field> {
    if all {
        Schema::columns().to_vec()
    } else if is_narrow() {
        vec![Field::AssetName, Field::Owner]
    } else {
        vec![
            Field::AssetName,
            Field::Owner,
            Field::Location,
            Field::SharedExternally,
            Field::LastAuditDate,
        ]
    }
}

/// Prints records as an aligned table, numbered from 1.
pub fn render_table(records: &[AssetRecord], columns: &[Field], quiet: bool) {
    let rows: Vec<Vec<String>> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            std::iter::once((i + 1).to_string())
                .chain(columns.iter().map(|&field| single_line(&record.value(field))))
                .collect()
        })
        .collect();

    if quiet {
        for row in rows {
            println!("{}", row.join("\t"));
        }
        return;
    }

    let headers: Vec<&str> = std::iter::once("#")
        .chain(columns.iter().map(|field| field.header()))
        .collect();

    // Determine column widths for alignment.
    let widths = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            rows.iter()
                .map(|row| row[idx].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count())
        })
        .collect::<Vec<_>>();

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(header, *width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header_line.trim_end());
    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", rule.dim());

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(value, width)| pad(value, *width))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", line.trim_end());
    }
}

fn render_json(records: &[AssetRecord]) -> anyhow::Result<()> {
    let rows: Vec<Value> = records
        .iter()
        .map(|record| {
            let object: Map<String, Value> = Schema::columns()
                .iter()
                .map(|&field| {
                    (
                        field.key().to_string(),
                        Value::String(record.value(field).into_owned()),
                    )
                })
                .collect();
            Value::Object(object)
        })
        .collect();

    serde_json::to_writer_pretty(std::io::stdout(), &rows)
        .context("failed to render json output")?;
    println!();
    Ok(())
}

/// Collapses line breaks so a value fits on one table line.
fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{value}{}", " ".repeat(width.saturating_sub(len)))
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_collapses_breaks() {
        assert_eq!(single_line("one\r\ntwo  three\n"), "one two three");
    }

    #[test]
    fn pad_counts_characters_not_bytes() {
        assert_eq!(pad("é", 3), "é  ");
        assert_eq!(pad("long", 2), "long");
    }

    #[test]
    fn all_columns_match_schema() {
        assert_eq!(summary_columns(true), Schema::columns());
    }
}
