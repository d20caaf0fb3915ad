//! The in-memory asset register.
//!
//! A [`Register`] is the ordered table a session compiles. It knows nothing
//! about files or forms: callers hand it [`CandidateFields`] and it decides,
//! through the [`Schema`], whether they become records.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{
    candidate::CandidateFields,
    record::AssetRecord,
    schema::{Schema, ValidationError},
};

/// How an imported table combines with the rows already in a register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Imported rows are added after the existing rows.
    #[default]
    Append,
    /// Imported rows become the whole register.
    Replace,
}

impl ImportMode {
    /// The name used on the command line and in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Replace => "replace",
        }
    }
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The text named neither import mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown import mode '{0}': expected 'append' or 'replace'")]
pub struct UnknownImportMode(String);

impl std::str::FromStr for ImportMode {
    type Err = UnknownImportMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            _ => Err(UnknownImportMode(s.to_string())),
        }
    }
}

/// An imported row that failed validation and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row {row} skipped: {error}")]
pub struct RowRejected {
    /// 1-based position of the row within the import, not counting the
    /// header.
    pub row: usize,
    /// Why the row was rejected.
    pub error: ValidationError,
}

/// The outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use]
pub struct ImportReport {
    /// How many rows were added.
    pub loaded: usize,
    /// Rows that were skipped, in import order.
    pub rejected: Vec<RowRejected>,
}

impl ImportReport {
    /// Whether every row was loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// The ordered collection of asset records compiled during a session.
///
/// Records keep their insertion order. The only ways to change a register are
/// [`append`](Self::append), [`bulk_load`](Self::bulk_load),
/// [`replace`](Self::replace) and [`reset`](Self::reset); each leaves the
/// register in a valid state whether it succeeds or not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Register {
    records: Vec<AssetRecord>,
}

impl Register {
    /// Creates an empty register.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a candidate and adds it to the end of the register.
    ///
    /// Returns the index of the new record.
    ///
    /// # Errors
    ///
    /// Returns the failing fields if the candidate does not satisfy the
    /// schema. The register is not modified.
    pub fn append(&mut self, candidate: &CandidateFields) -> Result<usize, ValidationError> {
        let record = Schema::resolve(candidate)?;
        let index = self.records.len();
        debug!(index, asset = record.asset_name(), "appended record");
        self.records.push(record);
        Ok(index)
    }

    /// Adds imported rows after the existing records.
    ///
    /// Each row is validated on its own. Rows that fail are skipped and
    /// reported; the rest keep their relative order.
    pub fn bulk_load<I>(&mut self, rows: I) -> ImportReport
    where
        I: IntoIterator<Item = CandidateFields>,
    {
        let (records, rejected) = resolve_rows(rows);
        let report = ImportReport {
            loaded: records.len(),
            rejected,
        };
        debug!(
            loaded = report.loaded,
            skipped = report.rejected.len(),
            existing = self.records.len(),
            "bulk loaded rows"
        );
        self.records.extend(records);
        report
    }

    /// Replaces the whole register with imported rows.
    ///
    /// Rows are validated exactly as in [`bulk_load`](Self::bulk_load). The
    /// existing records are only dropped once every row has been resolved.
    pub fn replace<I>(&mut self, rows: I) -> ImportReport
    where
        I: IntoIterator<Item = CandidateFields>,
    {
        let (records, rejected) = resolve_rows(rows);
        debug!(
            loaded = records.len(),
            skipped = rejected.len(),
            dropped = self.records.len(),
            "replaced register"
        );
        let report = ImportReport {
            loaded: records.len(),
            rejected,
        };
        self.records = records;
        report
    }

    /// Imports rows using the given mode.
    pub fn import<I>(&mut self, rows: I, mode: ImportMode) -> ImportReport
    where
        I: IntoIterator<Item = CandidateFields>,
    {
        match mode {
            ImportMode::Append => self.bulk_load(rows),
            ImportMode::Replace => self.replace(rows),
        }
    }

    /// Removes every record.
    pub fn reset(&mut self) {
        debug!(dropped = self.records.len(), "reset register");
        self.records.clear();
    }

    /// A read-only view of the records, in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> &[AssetRecord] {
        &self.records
    }

    /// The record at the given index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&AssetRecord> {
        self.records.get(index)
    }

    /// Iterates over the records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, AssetRecord> {
        self.records.iter()
    }

    /// The number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the register holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Register {
    type Item = &'a AssetRecord;
    type IntoIter = std::slice::Iter<'a, AssetRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn resolve_rows<I>(rows: I) -> (Vec<AssetRecord>, Vec<RowRejected>)
where
    I: IntoIterator<Item = CandidateFields>,
{
    let mut records = Vec::new();
    let mut rejected = Vec::new();
    for (i, candidate) in rows.into_iter().enumerate() {
        match Schema::resolve(&candidate) {
            Ok(record) => records.push(record),
            Err(error) => {
                let row = i + 1;
                warn!(row, "skipping imported row: {error}");
                rejected.push(RowRejected { row, error });
            }
        }
    }
    (records, rejected)
}
