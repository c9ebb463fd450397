#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! TSV codec for the card database datasets.
//!
//! Every record kind has one fixed column layout ([`schema`]); fields are
//! escaped textually ([`escape`]) so a row never contains a raw tab or line
//! break; whole datasets are read and written through [`file`]. Rows from
//! older, narrower layouts are tolerated on read and can be padded once with
//! [`migrate::pad_short_rows`].

pub mod escape;
pub mod file;
pub mod migrate;
pub mod schema;

pub use file::{Table, read_table, read_table_if_exists, write_table};
pub use schema::TsvRecord;

/// Errors from reading or writing dataset files.
#[derive(Debug, thiserror::Error)]
pub enum TsvError {
    /// An I/O operation on a dataset file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TSV reader or writer failed.
    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A field holds a value that cannot be decoded.
    #[error("Invalid value '{value}' in column '{column}'")]
    InvalidField {
        /// Column name from the schema.
        column: String,
        /// Offending value.
        value: String,
    },

    /// The file has no header row.
    #[error("TSV file {path} is empty")]
    Empty {
        /// Path to the file.
        path: String,
    },
}
