//! Domain models for the asset register.
//!
//! This module contains the record schema, the typed asset record, the raw
//! candidate fields a form supplies, the register itself, and configuration.

/// Raw, unvalidated form input.
pub mod candidate;
pub use candidate::CandidateFields;

mod config;
pub use config::Config;

/// The typed asset record and its enumerations.
pub mod record;
pub use record::{
    AssetRecord, BreachActionsStatus, Choice, Conditional, RopaStatus, SharedExternally,
};

/// The ordered register compiled during a session.
pub mod register;
pub use register::{ImportMode, ImportReport, Register, RowRejected};

pub mod schema;
pub use schema::{Field, FieldFailure, Reason, Schema, ValidationError};
