//! FAQ datasets: the FAQ listing (newest update first) and FAQ detail
//! pages.

use ygo_db_fetch::{DetailKind, ListKind, PageFetcher};
use ygo_db_models::{FaqEntry, FaqListEntry};
use ygo_db_parser::faq::count_list_rows;
use ygo_db_parser::{parse_faq_detail_html, parse_faq_id_list};
use ygo_db_reconcile::{Change, Dataset, StopTracker};

use super::{ListPager, SyncContext, collect_list_ids, crawl_work_list, save_dataset};
use crate::SyncError;
use crate::registry::DatasetSpec;
use crate::stats::SyncStats;
use crate::strategy::CrawlStrategy;

const DEFAULT_DATE_COLUMN: &str = "updatedAt";

fn list_ids(html: &str) -> (Vec<String>, usize) {
    (parse_faq_id_list(html), count_list_rows(html))
}

/// Updates the FAQ dataset.
///
/// Incremental runs walk the listing and fetch each entry, storing it only
/// when new or strictly newer, until the stop policy fires. Every other
/// strategy resolves a list of ids first and replaces those entries.
///
/// # Errors
///
/// Returns [`SyncError::Reconcile`] if the dataset or a checkpoint cannot
/// be read or written.
pub async fn sync_faq<F: PageFetcher + ?Sized>(
    ctx: &SyncContext<'_, F>,
    spec: &DatasetSpec,
    strategy: &CrawlStrategy,
    stats: &mut SyncStats,
) -> Result<(), SyncError> {
    let path = ctx.dataset_path(spec);
    let mut dataset = Dataset::load_for::<FaqEntry>(&path)?;

    let ids = match strategy {
        CrawlStrategy::Incremental => {
            scan_incremental(ctx, spec, &mut dataset, stats).await;
            if stats.has_changes() {
                save_dataset(&dataset, spec, &path, false)?;
            }
            stats.total_rows = dataset.len();
            return Ok(());
        }
        CrawlStrategy::Ids(ids) => ids.clone(),
        CrawlStrategy::ForceAll | CrawlStrategy::Top(_) | CrawlStrategy::Range { .. } => {
            collect_list_ids(ctx, ListKind::Faq, spec.page_size, strategy.window(), list_ids, stats)
                .await
        }
    };

    crawl_work_list(
        ctx,
        spec,
        DetailKind::Faq,
        &ids,
        &mut dataset,
        stats,
        parse_faq_detail_html,
    )
    .await?;

    if stats.fetched > 0 {
        save_dataset(&dataset, spec, &path, strategy.is_targeted())?;
    }
    stats.total_rows = dataset.len();
    Ok(())
}

/// Listing walk with change detection. Known ids are fetched (or not)
/// according to the stop policy.
async fn scan_incremental<F: PageFetcher + ?Sized>(
    ctx: &SyncContext<'_, F>,
    spec: &DatasetSpec,
    dataset: &mut Dataset,
    stats: &mut SyncStats,
) {
    let date_column = spec.date_column.as_deref().unwrap_or(DEFAULT_DATE_COLUMN);
    let policy = spec.stop_policy;
    let mut tracker = StopTracker::new(policy);
    let mut pager = ListPager::new(ListKind::Faq, spec.page_size);

    while let Some(html) = pager.next(ctx, stats).await {
        let (ids, rows) = list_ids(&html);

        for id in &ids {
            if dataset.contains(id) && !policy.fetches_known() {
                tracker.observe(id, Change::Unchanged);
                break;
            }

            let detail = match ctx.detail(DetailKind::Faq, id).await {
                Ok(html) => html,
                Err(e) => {
                    log::error!("Failed to fetch FAQ {id}: {e}");
                    stats.errors += 1;
                    continue;
                }
            };
            stats.fetched += 1;
            ctx.progress.inc(1);

            let Some(faq) = parse_faq_detail_html(&detail, id) else {
                log::debug!("Skipping unparseable FAQ {id}");
                stats.skipped += 1;
                continue;
            };

            let change = dataset.merge_if_newer(&faq, date_column, faq.updated_at.as_deref());
            log::debug!("FAQ {id}: {change}");
            stats.record(change);
            if !tracker.observe(id, change) {
                break;
            }
        }

        pager.finish_page(rows);
        if !tracker.is_scanning() {
            pager.stop();
        }
    }

    stats.stopped_at = tracker.finish();
}

/// Rebuilds the FAQ id list from the listing. New ids are prepended; ids
/// already listed keep their position.
///
/// # Errors
///
/// Returns [`SyncError::Unsupported`] for [`CrawlStrategy::Ids`] and
/// [`SyncError::Reconcile`] if the dataset cannot be read or written.
pub async fn sync_faq_ids<F: PageFetcher + ?Sized>(
    ctx: &SyncContext<'_, F>,
    spec: &DatasetSpec,
    strategy: &CrawlStrategy,
    stats: &mut SyncStats,
) -> Result<(), SyncError> {
    if strategy.is_targeted() {
        return Err(SyncError::Unsupported {
            dataset: spec.id.clone(),
            strategy: strategy.to_string(),
        });
    }

    let path = ctx.dataset_path(spec);
    let mut dataset = Dataset::load_for::<FaqListEntry>(&path)?;

    let ids =
        collect_list_ids(ctx, ListKind::Faq, spec.page_size, strategy.window(), list_ids, stats)
            .await;
    stats.fetched = ids.len();

    let entries: Vec<FaqListEntry> = ids
        .into_iter()
        .map(|faq_id| FaqListEntry { faq_id })
        .collect();
    let summary = dataset.merge(&entries);
    stats.new += summary.inserted;
    stats.unchanged += summary.replaced;

    if summary.inserted > 0 || !path.exists() {
        save_dataset(&dataset, spec, &path, false)?;
    }
    stats.total_rows = dataset.len();
    Ok(())
}
