//! Per-run counters.

use chrono::{DateTime, Utc};
use ygo_db_reconcile::Change;

/// What one run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStats {
    pub dataset: String,
    pub strategy: String,
    /// Listing pages fetched.
    pub pages: usize,
    /// Records fetched (detail pages, or card rows for the cards list).
    pub fetched: usize,
    pub new: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Responses that could not be parsed into a record.
    pub skipped: usize,
    /// Failed requests.
    pub errors: usize,
    /// The id the stop policy fired at.
    pub stopped_at: Option<String>,
    /// Rows in the dataset after the run.
    pub total_rows: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncStats {
    #[must_use]
    pub fn new(dataset: &str, strategy: &str) -> Self {
        Self {
            dataset: dataset.to_owned(),
            strategy: strategy.to_owned(),
            pages: 0,
            fetched: 0,
            new: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            errors: 0,
            stopped_at: None,
            total_rows: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub const fn record(&mut self, change: Change) {
        match change {
            Change::New => self.new += 1,
            Change::Updated => self.updated += 1,
            Change::Unchanged => self.unchanged += 1,
        }
    }

    /// Whether the run changed anything worth writing.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.new + self.updated > 0
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    #[must_use]
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

impl std::fmt::Display for SyncStats {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} ({})", self.dataset, self.strategy)?;
        writeln!(f, "  {:<12} {}", "pages", self.pages)?;
        writeln!(f, "  {:<12} {}", "fetched", self.fetched)?;
        writeln!(f, "  {:<12} {}", "new", self.new)?;
        writeln!(f, "  {:<12} {}", "updated", self.updated)?;
        writeln!(f, "  {:<12} {}", "unchanged", self.unchanged)?;
        writeln!(f, "  {:<12} {}", "skipped", self.skipped)?;
        writeln!(f, "  {:<12} {}", "errors", self.errors)?;
        if let Some(id) = &self.stopped_at {
            writeln!(f, "  {:<12} {id}", "stopped at")?;
        }
        writeln!(f, "  {:<12} {}", "total rows", self.total_rows)?;
        write!(
            f,
            "  {:<12} {:.1}s",
            "elapsed",
            self.elapsed().num_milliseconds() as f64 / 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_changes_and_renders_summary() {
        let mut stats = SyncStats::new("faq", "incremental");
        stats.record(Change::New);
        stats.record(Change::Updated);
        stats.record(Change::Unchanged);
        stats.stopped_at = Some("42".to_owned());
        stats.finish();

        assert!(stats.has_changes());
        assert_eq!((stats.new, stats.updated, stats.unchanged), (1, 1, 1));
        let summary = stats.to_string();
        assert!(summary.starts_with("faq (incremental)"));
        assert!(summary.contains("stopped at   42"));
    }
}
