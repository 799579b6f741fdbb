#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Branch record loading and attribute filtering.
//!
//! [`loader`] reads the branch table into a [`loader::RecordSet`], pairing
//! every record that has usable coordinates with a geographic point.
//! [`filter`] selects records by exact attribute matches.

pub mod filter;
pub mod loader;
pub mod progress;

pub use branch_corridor_records_models::{BankRecord, RecordField};

/// Errors that can occur while loading or filtering records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table could not be read as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A predicate named a column that records do not have.
    #[error("Unknown record field '{name}'")]
    UnknownField {
        /// The field name as written.
        name: String,
    },
}
