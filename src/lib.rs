//! Information Asset Register
//!
//! An asset register is an ordered table of information assets, compiled one
//! form submission at a time and exchanged as comma-separated text.

pub mod domain;
pub use domain::{
    AssetRecord, CandidateFields, Config, Field, ImportMode, ImportReport, Register, RowRejected,
    Schema, ValidationError,
};

/// CSV import and export, and registers stored on disk.
pub mod storage;
pub use storage::{DecodeError, LoadError, RegisterFile};
