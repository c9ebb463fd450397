//! Crawl loops, one module per dataset.
//!
//! Two shapes cover every dataset: walking a paginated listing
//! ([`ListPager`]) and fetching a precomputed list of ids
//! ([`crawl_work_list`]). Both are strictly sequential and wait the
//! politeness delay before every request but the first.

pub mod cards;
pub mod detail;
pub mod faq;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ygo_db_fetch::{DetailKind, FetchError, ListKind, PageFetcher, Politeness};
use ygo_db_reconcile::dataset::Change;
use ygo_db_reconcile::persist::{find_checkpoint, remove_checkpoints, write_checkpoint};
use ygo_db_reconcile::progress::ProgressCallback;
use ygo_db_reconcile::Dataset;
use ygo_db_tsv::TsvRecord;

use crate::SyncError;
use crate::registry::DatasetSpec;
use crate::stats::SyncStats;
use crate::strategy::Window;

/// Shared state for one run.
pub struct SyncContext<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    politeness: Politeness,
    progress: Arc<dyn ProgressCallback>,
    data_dir: PathBuf,
    start_from: Option<usize>,
    requested: AtomicBool,
}

impl<'a, F: PageFetcher + ?Sized> SyncContext<'a, F> {
    #[must_use]
    pub fn new(
        fetcher: &'a F,
        politeness: Politeness,
        progress: Arc<dyn ProgressCallback>,
        data_dir: PathBuf,
        start_from: Option<usize>,
    ) -> Self {
        Self {
            fetcher,
            politeness,
            progress,
            data_dir,
            start_from,
            requested: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn dataset_path(&self, spec: &DatasetSpec) -> PathBuf {
        self.data_dir.join(&spec.file_name)
    }

    async fn pause(&self) {
        if self.requested.swap(true, Ordering::Relaxed) {
            self.politeness.wait().await;
        }
    }

    async fn list_page(&self, kind: ListKind, page: u32) -> Result<String, FetchError> {
        self.pause().await;
        self.fetcher.fetch_list_page(kind, page).await
    }

    async fn detail(&self, kind: DetailKind, id: &str) -> Result<String, FetchError> {
        self.pause().await;
        self.fetcher.fetch_detail(kind, id).await
    }
}

// ── Listing pagination ───────────────────────────────────────────────

/// Walks listing pages from page 1 until a short page, an empty page, a
/// failed request, or [`ListPager::stop`].
pub(crate) struct ListPager {
    kind: ListKind,
    page_size: usize,
    next_page: u32,
    done: bool,
}

impl ListPager {
    pub(crate) const fn new(kind: ListKind, page_size: usize) -> Self {
        Self {
            kind,
            page_size,
            next_page: 1,
            done: false,
        }
    }

    /// Fetches the next page. A failed request is logged, counted, and
    /// ends pagination.
    pub(crate) async fn next<F: PageFetcher + ?Sized>(
        &mut self,
        ctx: &SyncContext<'_, F>,
        stats: &mut SyncStats,
    ) -> Option<String> {
        if self.done {
            return None;
        }
        let page = self.next_page;
        ctx.progress.set_message(format!("{} page {page}", self.kind));
        match ctx.list_page(self.kind, page).await {
            Ok(html) => {
                stats.pages += 1;
                self.next_page += 1;
                Some(html)
            }
            Err(e) => {
                log::error!("Failed to fetch {} page {page}: {e}", self.kind);
                stats.errors += 1;
                self.done = true;
                None
            }
        }
    }

    /// Reports how many rows the page just returned held.
    pub(crate) fn finish_page(&mut self, rows: usize) {
        if rows == 0 || rows < self.page_size {
            log::info!(
                "Reached the last {} page ({} with {rows} rows)",
                self.kind,
                self.next_page - 1
            );
            self.done = true;
        }
    }

    pub(crate) const fn stop(&mut self) {
        self.done = true;
    }
}

/// Collects ids from listing pages, in list order, limited to `window`
/// when given.
pub(crate) async fn collect_list_ids<F: PageFetcher + ?Sized>(
    ctx: &SyncContext<'_, F>,
    kind: ListKind,
    page_size: usize,
    window: Option<Window>,
    parse_ids: impl Fn(&str) -> (Vec<String>, usize),
    stats: &mut SyncStats,
) -> Vec<String> {
    let mut pager = ListPager::new(kind, page_size);
    let mut ids = Vec::new();
    let mut position = 0usize;

    while let Some(html) = pager.next(ctx, stats).await {
        let (page_ids, rows) = parse_ids(&html);
        for id in page_ids {
            if window.is_none_or(|w| w.contains(position)) {
                ids.push(id);
            }
            position += 1;
        }
        ctx.progress.set_position(position as u64);
        pager.finish_page(rows);
        if window.is_some_and(|w| position >= w.end()) {
            pager.stop();
        }
    }

    log::info!("Collected {} {kind} ids from {} pages", ids.len(), stats.pages);
    ids
}

// ── Work lists ───────────────────────────────────────────────────────

/// How a record compares with the stored row. Without a date column a
/// known id counts as updated, since it is always replaced.
pub(crate) fn change_for<R: TsvRecord>(spec: &DatasetSpec, dataset: &Dataset, record: &R) -> Change {
    let id = record.id();
    match &spec.date_column {
        Some(column) => dataset.classify(id, column, record_date(record, column).as_deref()),
        None if dataset.contains(id) => Change::Updated,
        None => Change::New,
    }
}

fn record_date<R: TsvRecord>(record: &R, column: &str) -> Option<String> {
    let index = R::HEADER.iter().position(|&h| h == column)?;
    record
        .to_fields()
        .into_iter()
        .nth(index)
        .filter(|v| !v.is_empty())
}

/// Fetches and merges every id in `ids`, in order.
///
/// Failed requests and unparseable pages are counted and skipped. Every
/// `checkpoint_every` records the merged dataset is written as a
/// checkpoint. With `start_from = N` the newest checkpoint at or below `N`
/// replaces `dataset` and the first `N` ids are skipped.
///
/// # Errors
///
/// Returns [`SyncError::Reconcile`] if a checkpoint cannot be read or
/// written.
pub(crate) async fn crawl_work_list<F, R>(
    ctx: &SyncContext<'_, F>,
    spec: &DatasetSpec,
    kind: DetailKind,
    ids: &[String],
    dataset: &mut Dataset,
    stats: &mut SyncStats,
    parse: impl Fn(&str, &str) -> Option<R>,
) -> Result<(), SyncError>
where
    F: PageFetcher + ?Sized,
    R: TsvRecord,
{
    let path = ctx.dataset_path(spec);
    let mut skip = 0;

    if let Some(start_from) = ctx.start_from {
        skip = start_from.min(ids.len());
        if let Some((index, checkpoint)) = find_checkpoint(&path, start_from)? {
            log::info!("Resuming from checkpoint {index} ({})", checkpoint.display());
            *dataset = Dataset::load_for::<R>(&checkpoint)?;
        } else {
            log::warn!("No checkpoint at or below {start_from}; resuming on top of the dataset file");
        }
        log::info!("Skipping the first {skip} of {} ids", ids.len());
    }

    ctx.progress.set_total(ids.len() as u64);
    ctx.progress.set_position(skip as u64);

    for (index, id) in ids.iter().enumerate().skip(skip) {
        ctx.progress.set_message(format!("{kind} {id}"));
        match ctx.detail(kind, id).await {
            Err(e) => {
                log::error!("Failed to fetch {kind} {id}: {e}");
                stats.errors += 1;
            }
            Ok(html) => {
                stats.fetched += 1;
                if let Some(record) = parse(&html, id) {
                    let change = change_for(spec, dataset, &record);
                    dataset.upsert_record(&record);
                    stats.record(change);
                } else {
                    log::debug!("Skipping unparseable {kind} page for {id}");
                    stats.skipped += 1;
                }
            }
        }
        ctx.progress.inc(1);

        let processed = index + 1;
        if spec.checkpoint_every > 0
            && processed % spec.checkpoint_every == 0
            && processed < ids.len()
        {
            write_checkpoint(dataset, &path, processed, spec.order)?;
        }
    }

    Ok(())
}

/// Writes the dataset back, with a backup first for targeted updates, and
/// clears checkpoints once the file is complete.
///
/// # Errors
///
/// Returns [`SyncError::Reconcile`] if the write fails.
pub(crate) fn save_dataset(
    dataset: &Dataset,
    spec: &DatasetSpec,
    path: &Path,
    backup: bool,
) -> Result<(), SyncError> {
    if backup {
        dataset.save_with_backup(path, spec.order)?;
    } else {
        dataset.save(path, spec.order)?;
    }
    if spec.checkpoint_every > 0 {
        remove_checkpoints(path)?;
    }
    Ok(())
}
