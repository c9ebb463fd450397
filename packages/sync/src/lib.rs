#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Keeps local TSV copies of the Yu-Gi-Oh! card database up to date.
//!
//! Each run targets one dataset from the [`registry`], fetches what the
//! [`strategy::CrawlStrategy`] asks for through a
//! [`ygo_db_fetch::PageFetcher`], and merges the result into the dataset
//! file.

pub mod config;
pub mod crawl;
pub mod registry;
pub mod stats;
pub mod strategy;

use std::sync::Arc;

use ygo_db_fetch::{FetchError, PageFetcher};
use ygo_db_reconcile::ReconcileError;
use ygo_db_reconcile::progress::ProgressCallback;
use ygo_db_tsv::TsvError;
use ygo_db_tsv::migrate::{PaddingReport, pad_short_rows};

use crate::config::SyncConfig;
use crate::crawl::SyncContext;
use crate::registry::{DatasetKind, dataset};
use crate::stats::SyncStats;
use crate::strategy::CrawlStrategy;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Tsv(#[from] TsvError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A file the run depends on is missing or unusable.
    #[error("Required input {path} is unusable: {reason}")]
    MissingInput { path: String, reason: String },

    /// No session cookies could be obtained.
    #[error("Could not establish a session: {message}")]
    Session { message: String },

    #[error("The {dataset} dataset does not support {strategy}")]
    Unsupported { dataset: String, strategy: String },
}

/// Per-run options on top of [`SyncConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub strategy: CrawlStrategy,
    /// Resume a work-list crawl at this position.
    pub start_from: Option<usize>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            strategy: CrawlStrategy::Incremental,
            start_from: None,
        }
    }
}

const fn needs_session(kind: DatasetKind) -> bool {
    matches!(kind, DatasetKind::Detail | DatasetKind::Faq)
}

const fn supports_ids(kind: DatasetKind) -> bool {
    matches!(kind, DatasetKind::Detail | DatasetKind::Faq)
}

/// Runs one dataset update and returns its counters.
///
/// # Errors
///
/// Returns [`SyncError::Unsupported`] for an id list on a listing-only
/// dataset, [`SyncError::Session`] if the FAQ session cannot be
/// established, [`SyncError::MissingInput`] if a prerequisite dataset is
/// unusable, and I/O errors from reading or writing datasets. Individual
/// fetch failures are counted in [`SyncStats::errors`] instead.
pub async fn sync_dataset<F: PageFetcher>(
    fetcher: &mut F,
    config: &SyncConfig,
    kind: DatasetKind,
    options: &SyncOptions,
    progress: Arc<dyn ProgressCallback>,
) -> Result<SyncStats, SyncError> {
    let spec = dataset(kind);
    if options.strategy.is_targeted() && !supports_ids(kind) {
        return Err(SyncError::Unsupported {
            dataset: spec.id,
            strategy: options.strategy.to_string(),
        });
    }

    log::info!(
        "Syncing {} ({}) into {}",
        spec.name,
        options.strategy,
        config.dataset_path(&spec).display()
    );

    if needs_session(kind) {
        fetcher.establish_session().await.map_err(|e| match e {
            FetchError::Session { message } => SyncError::Session { message },
            other => SyncError::Session {
                message: other.to_string(),
            },
        })?;
    }

    std::fs::create_dir_all(&config.data_dir).map_err(|e| SyncError::Io {
        path: config.data_dir.display().to_string(),
        source: e,
    })?;

    let ctx = SyncContext::new(
        &*fetcher,
        config.politeness(),
        Arc::clone(&progress),
        config.data_dir.clone(),
        options.start_from,
    );
    let mut stats = SyncStats::new(&spec.id, &options.strategy.to_string());

    match kind {
        DatasetKind::Cards => {
            crawl::cards::sync_cards(&ctx, &spec, &options.strategy, &mut stats).await?;
        }
        DatasetKind::Detail => {
            crawl::detail::sync_detail(&ctx, &spec, &options.strategy, &mut stats).await?;
        }
        DatasetKind::Faq => {
            crawl::faq::sync_faq(&ctx, &spec, &options.strategy, &mut stats).await?;
        }
        DatasetKind::FaqIds => {
            crawl::faq::sync_faq_ids(&ctx, &spec, &options.strategy, &mut stats).await?;
        }
    }

    stats.finish();
    progress.finish(format!(
        "{}: {} new, {} updated, {} errors",
        spec.id, stats.new, stats.updated, stats.errors
    ));
    log::info!(
        "Sync complete for {}: {} new, {} updated, {} unchanged, {} skipped, {} errors ({} rows)",
        spec.id,
        stats.new,
        stats.updated,
        stats.unchanged,
        stats.skipped,
        stats.errors,
        stats.total_rows
    );
    Ok(stats)
}

/// Pads short rows in the cards dataset to the current column count.
///
/// # Errors
///
/// Returns [`SyncError::Tsv`] if the file is missing, empty, or cannot be
/// rewritten.
pub fn migrate_columns(config: &SyncConfig) -> Result<PaddingReport, SyncError> {
    let path = config.dataset_path(&dataset(DatasetKind::Cards));
    Ok(pad_short_rows(&path)?)
}

#[cfg(test)]
mod tests {
    use ygo_db_fetch::{DetailKind, ListKind, Politeness};
    use ygo_db_reconcile::progress::null_progress;

    use super::*;
    use crate::crawl::fake::FakeFetcher;

    fn config(name: &str) -> SyncConfig {
        let dir =
            std::env::temp_dir().join(format!("ygo_db_sync_lib_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        SyncConfig {
            data_dir: dir,
            delay_ms: 0,
            ..SyncConfig::default()
        }
    }

    #[tokio::test]
    async fn ids_on_the_cards_dataset_fail_before_any_request() {
        let config = config("cards_ids");
        let mut fetcher = FakeFetcher::default();
        let options = SyncOptions {
            strategy: CrawlStrategy::Ids(vec!["1".to_owned()]),
            start_from: None,
        };
        let result =
            sync_dataset(&mut fetcher, &config, DatasetKind::Cards, &options, null_progress()).await;
        assert!(matches!(result, Err(SyncError::Unsupported { .. })));
        assert_eq!(fetcher.sessions, 0);
        assert!(fetcher.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn faq_runs_establish_a_session_and_write_the_dataset() {
        let config = config("faq");
        assert_eq!(config.politeness(), Politeness::NONE);
        let mut fetcher = FakeFetcher::default()
            .list(
                ListKind::Faq,
                1,
                r#"<div class="t_row"><input class="link_value" value="faq_search.action?ope=5&fid=1"></div>"#,
            )
            .detail(
                DetailKind::Faq,
                "1",
                r#"<div id="question_text">Q</div><div id="answer_text">A</div><div id="tag_update"><span class="date">2024-01-01</span></div>"#,
            );

        let stats = sync_dataset(
            &mut fetcher,
            &config,
            DatasetKind::Faq,
            &SyncOptions::default(),
            null_progress(),
        )
        .await
        .unwrap();

        assert_eq!(fetcher.sessions, 1);
        assert_eq!(stats.new, 1);
        assert!(stats.finished_at.is_some());
        assert!(config.data_dir.join("faq-all.tsv").exists());

        std::fs::remove_dir_all(&config.data_dir).unwrap();
    }

    #[test]
    fn migrate_columns_pads_the_cards_file() {
        let config = config("migrate");
        std::fs::create_dir_all(&config.data_dir).unwrap();
        let path = config.data_dir.join("cards-all.tsv");
        std::fs::write(&path, "cardType\tname\tcardId\nspell\tx\n").unwrap();

        let report = migrate_columns(&config).unwrap();
        assert_eq!(report.total_padded(), 1);
        assert!(report.backup.exists());

        std::fs::remove_dir_all(&config.data_dir).unwrap();
    }
}
