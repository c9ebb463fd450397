//! Detail dataset: supplement text from each card's Q&A page.
//!
//! There is no listing to walk. The work list is derived from the cards
//! dataset, which must therefore exist and be non-empty.

use std::path::Path;

use ygo_db_fetch::{DetailKind, PageFetcher};
use ygo_db_models::{Card, CardSupplement};
use ygo_db_parser::parse_card_supplement_html;
use ygo_db_reconcile::Dataset;
use ygo_db_tsv::{TsvRecord, read_table_if_exists};

use super::{SyncContext, crawl_work_list, save_dataset};
use crate::SyncError;
use crate::registry::{DatasetKind, DatasetSpec, dataset};
use crate::stats::SyncStats;
use crate::strategy::CrawlStrategy;

/// Every card id in the cards dataset, in file order.
///
/// # Errors
///
/// Returns [`SyncError::MissingInput`] if the file is missing, has no
/// `cardId` column, or lists no cards.
pub fn load_card_ids(path: &Path) -> Result<Vec<String>, SyncError> {
    let missing = |reason: &str| SyncError::MissingInput {
        path: path.display().to_string(),
        reason: reason.to_owned(),
    };

    let table = read_table_if_exists(path)?.ok_or_else(|| missing("file not found"))?;
    let ids = table
        .column_values(Card::ID_COLUMN)
        .ok_or_else(|| missing("no cardId column"))?;
    if ids.is_empty() {
        return Err(missing("no card ids"));
    }
    Ok(ids)
}

/// Fetches Q&A pages and stores their supplement text.
///
/// `Incremental` fetches cards not yet in the dataset, `ForceAll` every
/// card, `Top`/`Range` a slice of the cards dataset, `Ids` exactly the
/// given cards (replaced in place after a backup).
///
/// # Errors
///
/// Returns [`SyncError::MissingInput`] if the cards dataset is unusable
/// (not needed for `Ids`) and [`SyncError::Reconcile`] on dataset I/O
/// failures.
pub async fn sync_detail<F: PageFetcher + ?Sized>(
    ctx: &SyncContext<'_, F>,
    spec: &DatasetSpec,
    strategy: &CrawlStrategy,
    stats: &mut SyncStats,
) -> Result<(), SyncError> {
    let path = ctx.dataset_path(spec);
    let mut details = Dataset::load_for::<CardSupplement>(&path)?;

    let ids = if let CrawlStrategy::Ids(ids) = strategy {
        ids.clone()
    } else {
        let card_ids = load_card_ids(&ctx.dataset_path(&dataset(DatasetKind::Cards)))?;
        log::info!("{} card ids in the cards dataset", card_ids.len());
        match strategy {
            CrawlStrategy::Incremental => card_ids
                .into_iter()
                .filter(|id| !details.contains(id))
                .collect(),
            CrawlStrategy::Top(_) | CrawlStrategy::Range { .. } => strategy
                .window()
                .map(|w| w.slice(&card_ids).to_vec())
                .unwrap_or_default(),
            CrawlStrategy::ForceAll | CrawlStrategy::Ids(_) => card_ids,
        }
    };

    if ids.is_empty() {
        log::info!("No cards need fetching");
        stats.total_rows = details.len();
        return Ok(());
    }
    log::info!("Fetching {} Q&A pages", ids.len());

    crawl_work_list(
        ctx,
        spec,
        DetailKind::Supplement,
        &ids,
        &mut details,
        stats,
        // A page without a card name still yields a row keyed by the id.
        |html, id| Some(parse_card_supplement_html(html, id)),
    )
    .await?;

    if stats.fetched > 0 {
        save_dataset(&details, spec, &path, strategy.is_targeted())?;
    }
    stats.total_rows = details.len();
    Ok(())
}
