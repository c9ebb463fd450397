//! How much of a dataset a run touches.

use std::path::Path;

use crate::SyncError;

/// Which records a run fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStrategy {
    /// New (and, for dated records, updated) records only, ending at the
    /// dataset's stop policy.
    Incremental,
    /// The `n` newest entries.
    Top(usize),
    /// `len` entries starting at 0-based position `start`.
    Range { start: usize, len: usize },
    /// Everything, ignoring the stop policy.
    ForceAll,
    /// Exactly these ids.
    Ids(Vec<String>),
}

impl std::fmt::Display for CrawlStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Incremental => f.write_str("incremental"),
            Self::Top(n) => write!(f, "top {n}"),
            Self::Range { start, len } => {
                write!(f, "range {start}..{}", start.saturating_add(*len))
            }
            Self::ForceAll => f.write_str("force-all"),
            Self::Ids(ids) => write!(f, "{} ids", ids.len()),
        }
    }
}

/// A positional slice of a newest-first list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub len: usize,
}

impl Window {
    /// One past the last admitted position.
    #[must_use]
    pub const fn end(self) -> usize {
        self.start.saturating_add(self.len)
    }

    #[must_use]
    pub const fn contains(self, position: usize) -> bool {
        position >= self.start && position < self.end()
    }

    /// The part of `items` inside the window.
    #[must_use]
    pub fn slice<T>(self, items: &[T]) -> &[T] {
        let start = self.start.min(items.len());
        let end = self.end().min(items.len());
        &items[start..end]
    }
}

impl CrawlStrategy {
    /// The positional window for [`CrawlStrategy::Top`] and
    /// [`CrawlStrategy::Range`].
    #[must_use]
    pub const fn window(&self) -> Option<Window> {
        match *self {
            Self::Top(n) => Some(Window { start: 0, len: n }),
            Self::Range { start, len } => Some(Window { start, len }),
            _ => None,
        }
    }

    /// Whether the run replaces specific rows in place.
    #[must_use]
    pub const fn is_targeted(&self) -> bool {
        matches!(self, Self::Ids(_))
    }
}

/// Splits a comma-separated id list, dropping blanks.
#[must_use]
pub fn parse_id_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Reads one id per line, dropping blank lines.
///
/// # Errors
///
/// Returns [`SyncError::MissingInput`] if the file cannot be read.
pub fn read_ids_file(path: &Path) -> Result<Vec<String>, SyncError> {
    let text = std::fs::read_to_string(path).map_err(|e| SyncError::MissingInput {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows() {
        let top = CrawlStrategy::Top(3).window().unwrap();
        assert_eq!(top.slice(&[1, 2, 3, 4, 5]), &[1, 2, 3]);

        let range = CrawlStrategy::Range { start: 3, len: 10 }.window().unwrap();
        assert!(range.contains(3));
        assert!(!range.contains(13));
        assert_eq!(range.slice(&[1, 2, 3, 4, 5]), &[4, 5]);
        assert!(range.slice(&[1, 2]).is_empty());

        assert_eq!(CrawlStrategy::Incremental.window(), None);
    }

    #[test]
    fn display_saturates_huge_ranges() {
        let huge = CrawlStrategy::Range {
            start: usize::MAX,
            len: 1,
        };
        assert_eq!(huge.to_string(), format!("range {0}..{0}", usize::MAX));
        assert_eq!(CrawlStrategy::Range { start: 3, len: 10 }.to_string(), "range 3..13");
    }

    #[test]
    fn id_lists() {
        assert_eq!(parse_id_list(" 12, ,34,"), vec!["12", "34"]);

        let path = std::env::temp_dir().join(format!("ygo_db_sync_ids_{}.txt", std::process::id()));
        std::fs::write(&path, "100\n\n  200 \n").unwrap();
        assert_eq!(read_ids_file(&path).unwrap(), vec!["100", "200"]);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            read_ids_file(Path::new("/nonexistent/ids.txt")),
            Err(SyncError::MissingInput { .. })
        ));
    }
}
