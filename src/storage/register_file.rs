//! A register backed by a CSV file.
//!
//! The [`RegisterFile`] binds a [`Register`] to a path, so that a sequence of
//! command-line invocations can build up one register. It is a thin wrapper
//! around the file-agnostic [`Register`].

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::{
    domain::{CandidateFields, ImportMode, ImportReport, Register, RowRejected},
    storage::csv::{self, DecodeError},
};

/// Errors that can occur when reading a register file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {}", .path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not a well-formed table.
    #[error("failed to decode {}", .path.display())]
    Decode {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: DecodeError,
    },
    /// The file decoded, but some rows are not valid records.
    ///
    /// Opening such a file for editing would silently drop those rows on the
    /// next save.
    #[error("{} has {} invalid rows", .path.display(), .rejected.len())]
    InvalidRows {
        /// The file being read.
        path: PathBuf,
        /// The rows that failed validation.
        rejected: Vec<RowRejected>,
    },
}

/// Reads and decodes a table from disk without validating its rows.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a well-formed table.
pub fn read_rows(path: &Path) -> Result<Vec<CandidateFields>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    csv::decode(&text).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// A register stored in a CSV file.
#[derive(Debug)]
pub struct RegisterFile {
    path: PathBuf,
    register: Register,
}

impl RegisterFile {
    /// Opens the register stored at the given path.
    ///
    /// A file that does not exist yet opens as an empty register; it is
    /// created on the first [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a well-formed
    /// table, or contains rows that are not valid records.
    #[instrument(level = "debug")]
    pub fn open(path: PathBuf) -> Result<Self, LoadError> {
        if !path.exists() {
            debug!("no register at {}, starting empty", path.display());
            return Ok(Self {
                path,
                register: Register::new(),
            });
        }

        let rows = read_rows(&path)?;
        let mut register = Register::new();
        let report = register.bulk_load(rows);
        if !report.is_clean() {
            return Err(LoadError::InvalidRows {
                path,
                rejected: report.rejected,
            });
        }

        debug!(records = register.len(), "opened register");
        Ok(Self { path, register })
    }

    /// The path the register is stored at.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The register.
    #[must_use]
    pub const fn register(&self) -> &Register {
        &self.register
    }

    /// The register, for modification.
    pub const fn register_mut(&mut self) -> &mut Register {
        &mut self.register
    }

    /// Imports a table from another file into the register.
    ///
    /// The source is decoded in full before the register is touched, so a
    /// malformed source leaves it as it was. Nothing is written to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or is not a well-formed
    /// table.
    #[instrument(level = "debug", skip(self), fields(register = %self.path.display()))]
    pub fn import_from(
        &mut self,
        source: &Path,
        mode: ImportMode,
    ) -> Result<ImportReport, LoadError> {
        let rows = read_rows(source)?;
        Ok(self.register.import(rows, mode))
    }

    /// Writes the register back to its file.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        csv::encode_to(self.register.snapshot(), &mut writer)?;
        writer.flush()?;
        debug!(records = self.register.len(), "saved {}", self.path.display());
        Ok(())
    }
}

/// The name of an export made on the given date.
///
/// The first export of a day is `{prefix}_{date}.csv`; later ones carry a
/// sequence number, `{prefix}_{date}-2.csv` and so on.
#[must_use]
pub fn export_file_name(prefix: &str, date: NaiveDate, sequence: usize) -> String {
    if sequence <= 1 {
        format!("{prefix}_{date}.csv")
    } else {
        format!("{prefix}_{date}-{sequence}.csv")
    }
}

/// Writes a timestamped copy of a register into a directory.
///
/// Never overwrites an existing file: if today's name is taken, the next
/// sequence number is used.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or written to.
#[instrument(level = "debug", skip(register))]
pub fn export(
    register: &Register,
    dir: &Path,
    prefix: &str,
    date: NaiveDate,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut sequence = 1;
    let (path, file) = loop {
        let path = dir.join(export_file_name(prefix, date, sequence));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => sequence += 1,
            Err(e) => return Err(e),
        }
    };

    let mut writer = BufWriter::new(file);
    csv::encode_to(register.snapshot(), &mut writer)?;
    writer.flush()?;
    debug!(records = register.len(), "exported to {}", path.display());
    Ok(path)
}
