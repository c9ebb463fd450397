//! Dataset registry, loaded from TOML files embedded at compile time.
//!
//! Each file in `packages/sync/datasets/` describes one dataset: where it
//! lives, how rows are keyed and ordered, and when a crawl of it stops.

use serde::Deserialize;
use strum_macros::{AsRefStr, Display, EnumString};
use ygo_db_reconcile::{MergeOrder, StopPolicy};

/// The datasets this tool maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DatasetKind {
    /// Card search results, one row per card.
    Cards,
    /// Supplement text per card, keyed by the ids in the cards dataset.
    Detail,
    /// FAQ entries.
    Faq,
    /// Bare list of every FAQ id.
    FaqIds,
}

impl DatasetKind {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Cards, Self::Detail, Self::Faq, Self::FaqIds]
    }
}

/// One dataset's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetSpec {
    pub id: String,
    pub name: String,
    /// File name inside the data directory.
    pub file_name: String,
    pub id_column: String,
    /// Column holding a lexically comparable update date, for datasets
    /// whose records are only replaced when newer.
    #[serde(default)]
    pub date_column: Option<String>,
    pub order: MergeOrder,
    pub stop_policy: StopPolicy,
    /// Rows per listing page; a shorter page is the last one.
    pub page_size: usize,
    /// Records between checkpoints during long work-list crawls. `0`
    /// disables checkpoints.
    #[serde(default)]
    pub checkpoint_every: usize,
}

const DATASET_TOMLS: &[(DatasetKind, &str)] = &[
    (DatasetKind::Cards, include_str!("../datasets/cards.toml")),
    (DatasetKind::Detail, include_str!("../datasets/detail.toml")),
    (DatasetKind::Faq, include_str!("../datasets/faq.toml")),
    (DatasetKind::FaqIds, include_str!("../datasets/faq_ids.toml")),
];

/// Parses a dataset definition.
///
/// # Errors
///
/// Returns the TOML error if the definition is malformed.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetSpec, toml::de::Error> {
    toml::de::from_str(toml_str)
}

/// The definition for `kind`.
///
/// # Panics
///
/// Panics if an embedded TOML file is malformed.
#[must_use]
pub fn dataset(kind: DatasetKind) -> DatasetSpec {
    DATASET_TOMLS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {kind}.toml: {e}"))
        })
        .unwrap_or_else(|| panic!("No dataset definition for {kind}"))
}

/// Every dataset definition, in registry order.
#[must_use]
pub fn all_datasets() -> Vec<DatasetSpec> {
    DatasetKind::all().iter().map(|&k| dataset(k)).collect()
}
