#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incremental reconciliation of freshly fetched records with a dataset on
//! disk.
//!
//! A [`dataset::Dataset`] is read fully, merged in memory (last write wins
//! per id, or "only if newer" for dated records) and rewritten wholesale
//! through [`persist`]. List-scanning crawls decide when to stop with
//! [`stop::StopTracker`].

pub mod dataset;
pub mod persist;
pub mod progress;
pub mod stop;

pub use dataset::{Change, Dataset, MergeOrder, MergeSummary, Upsert, is_newer};
pub use stop::{CrawlState, StopPolicy, StopTracker, should_stop};

/// Errors from loading or saving datasets.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Tsv(#[from] ygo_db_tsv::TsvError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The dataset's header has no column to key rows by.
    #[error("Dataset {path} has no '{column}' column")]
    MissingIdColumn { path: String, column: String },
}
