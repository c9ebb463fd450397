//! Cards dataset: the card search listing, newest card first.

use ygo_db_fetch::{ListKind, PageFetcher};
use ygo_db_models::Card;
use ygo_db_parser::parse_card_list_page;
use ygo_db_reconcile::{Change, Dataset, StopPolicy, StopTracker};

use super::{ListPager, SyncContext, save_dataset};
use crate::SyncError;
use crate::registry::DatasetSpec;
use crate::stats::SyncStats;
use crate::strategy::CrawlStrategy;

/// Walks the card listing and merges the collected cards into the cards
/// dataset, rewritten in descending id order.
///
/// [`CrawlStrategy::Incremental`] ends at the dataset's stop policy;
/// `Top`/`Range` collect a positional slice; `ForceAll` walks every page.
///
/// # Errors
///
/// Returns [`SyncError::Unsupported`] for [`CrawlStrategy::Ids`], which
/// the listing cannot serve, and [`SyncError::Reconcile`] if the dataset
/// cannot be read or written.
pub async fn sync_cards<F: PageFetcher + ?Sized>(
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
    let mut dataset = Dataset::load_for::<Card>(&path)?;

    let policy = match strategy {
        CrawlStrategy::Incremental => spec.stop_policy,
        _ => StopPolicy::Never,
    };
    let window = strategy.window();
    let mut tracker = StopTracker::new(policy);
    let mut pager = ListPager::new(ListKind::Cards, spec.page_size);
    let mut collected: Vec<Card> = Vec::new();
    let mut position = 0usize;

    while let Some(html) = pager.next(ctx, stats).await {
        let page = parse_card_list_page(&html);
        stats.skipped += page.skipped;

        for card in page.cards {
            let current = position;
            position += 1;
            if let Some(w) = window
                && !w.contains(current)
            {
                continue;
            }

            let change = if dataset.contains(card.card_id()) {
                Change::Unchanged
            } else {
                Change::New
            };
            if !tracker.observe(card.card_id(), change) {
                break;
            }
            stats.fetched += 1;
            collected.push(card);
        }

        log::info!(
            "Cards page {}: {} rows, {} collected so far",
            stats.pages,
            page.rows,
            collected.len()
        );
        ctx.progress.set_position(collected.len() as u64);

        pager.finish_page(page.rows);
        if !tracker.is_scanning() || window.is_some_and(|w| position >= w.end()) {
            pager.stop();
        }
    }

    stats.stopped_at = tracker.finish();

    let summary = dataset.merge(&collected);
    stats.new += summary.inserted;
    stats.updated += summary.replaced;
    log::info!(
        "Merged {} cards ({} new, {} replaced)",
        collected.len(),
        summary.inserted,
        summary.replaced
    );

    if !collected.is_empty() {
        save_dataset(&dataset, spec, &path, false)?;
    }
    stats.total_rows = dataset.len();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ygo_db_fetch::Politeness;
    use ygo_db_reconcile::progress::null_progress;
    use ygo_db_tsv::read_table;

    use super::*;
    use crate::crawl::fake::FakeFetcher;
    use crate::registry::{DatasetKind, dataset};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ygo_db_sync_cards_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn spell_row(cid: u32) -> String {
        format!(
            r#"<div class="t_row"><input type="hidden" class="link_value" value="/yugiohdb/card_search.action?ope=2&cid={cid}"><span class="card_name">魔法{cid}</span><span class="box_card_attribute"><img src="/image/parts/attribute/attribute_icon_spell.png"></span><dd class="box_card_text">効果</dd></div>"#
        )
    }

    fn list_page(cids: &[u32]) -> String {
        let rows: String = cids.iter().map(|&c| spell_row(c)).collect();
        format!("<html><body><div id=\"card_list\">{rows}</div></body></html>")
    }

    fn small_pages() -> DatasetSpec {
        DatasetSpec {
            page_size: 3,
            ..dataset(DatasetKind::Cards)
        }
    }

    fn ids_in(path: &std::path::Path) -> Vec<String> {
        let table = read_table(path).unwrap();
        let index = table.column_index("cardId").unwrap();
        table.rows.iter().map(|r| r[index].clone()).collect()
    }

    async fn run(fetcher: &FakeFetcher, dir: &std::path::Path, strategy: CrawlStrategy) -> SyncStats {
        let ctx = SyncContext::new(fetcher, Politeness::NONE, null_progress(), dir.to_path_buf(), None);
        let mut stats = SyncStats::new("cards", &strategy.to_string());
        sync_cards(&ctx, &small_pages(), &strategy, &mut stats).await.unwrap();
        stats
    }

    #[tokio::test]
    async fn incremental_stops_at_first_known_card_and_sorts_descending() {
        let dir = temp_dir("incremental");
        let first = FakeFetcher::default()
            .list(ListKind::Cards, 1, list_page(&[10, 9, 8]))
            .list(ListKind::Cards, 2, list_page(&[7]));
        let stats = run(&first, &dir, CrawlStrategy::Incremental).await;
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.new, 4);
        assert_eq!(ids_in(&dir.join("cards-all.tsv")), vec!["10", "9", "8", "7"]);

        let second = FakeFetcher::default()
            .list(ListKind::Cards, 1, list_page(&[12, 11, 10]))
            .list(ListKind::Cards, 2, list_page(&[9, 8, 7]));
        let stats = run(&second, &dir, CrawlStrategy::Incremental).await;
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.new, 2);
        assert_eq!(stats.stopped_at.as_deref(), Some("10"));
        assert_eq!(
            ids_in(&dir.join("cards-all.tsv")),
            vec!["12", "11", "10", "9", "8", "7"]
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn range_collects_a_positional_slice_across_pages() {
        let dir = temp_dir("range");
        let fetcher = FakeFetcher::default()
            .list(ListKind::Cards, 1, list_page(&[20, 19, 18]))
            .list(ListKind::Cards, 2, list_page(&[17, 16, 15]))
            .list(ListKind::Cards, 3, list_page(&[14, 13, 12]));
        let stats = run(&fetcher, &dir, CrawlStrategy::Range { start: 2, len: 3 }).await;
        assert_eq!(stats.pages, 2);
        assert_eq!(ids_in(&dir.join("cards-all.tsv")), vec!["18", "17", "16"]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn force_all_replaces_known_cards() {
        let dir = temp_dir("force_all");
        let fetcher = FakeFetcher::default().list(ListKind::Cards, 1, list_page(&[3, 2]));
        run(&fetcher, &dir, CrawlStrategy::Incremental).await;
        let stats = run(&fetcher, &dir, CrawlStrategy::ForceAll).await;
        assert_eq!((stats.new, stats.updated), (0, 2));
        assert_eq!(stats.stopped_at, None);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn ids_are_rejected() {
        let dir = temp_dir("ids");
        let fetcher = FakeFetcher::default();
        let ctx = SyncContext::new(&fetcher, Politeness::NONE, null_progress(), dir.clone(), None);
        let mut stats = SyncStats::new("cards", "ids");
        let result = sync_cards(
            &ctx,
            &small_pages(),
            &CrawlStrategy::Ids(vec!["1".to_owned()]),
            &mut stats,
        )
        .await;
        assert!(matches!(result, Err(SyncError::Unsupported { .. })));
        assert!(fetcher.requests.lock().unwrap().is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
