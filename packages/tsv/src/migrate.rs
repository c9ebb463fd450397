//! One-time column-padding migration for datasets written by an older,
//! narrower schema.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::TsvError;
use crate::file::{read_table, write_backup, write_table};

/// Outcome of [`pad_short_rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddingReport {
    /// Column count taken from the header row.
    pub columns: usize,
    /// Data rows in the file.
    pub rows: usize,
    /// Padded rows, keyed by the value of the first column (the card type
    /// for the cards dataset).
    pub padded: BTreeMap<String, usize>,
    /// Copy of the file as it was before the rewrite.
    pub backup: PathBuf,
}

impl PaddingReport {
    #[must_use]
    pub fn total_padded(&self) -> usize {
        self.padded.values().sum()
    }
}

/// Pads every data row shorter than the header with empty trailing fields.
///
/// The original file is copied to `<file>.backup` before it is rewritten.
/// Rows already at (or beyond) the header width are left untouched.
///
/// # Errors
///
/// Returns [`TsvError::Io`] if the file is missing or the backup cannot be
/// written, [`TsvError::Empty`] if the file has no header row, and
/// [`TsvError::Csv`] on read/write failures.
pub fn pad_short_rows(path: &Path) -> Result<PaddingReport, TsvError> {
    let mut table = read_table(path)?;
    if table.header.is_empty() {
        return Err(TsvError::Empty {
            path: path.display().to_string(),
        });
    }

    let backup = write_backup(path)?;
    let columns = table.header.len();
    let mut padded = BTreeMap::new();

    for row in &mut table.rows {
        if row.len() >= columns {
            continue;
        }
        let kind = row.first().cloned().unwrap_or_default();
        row.resize(columns, String::new());
        *padded.entry(kind).or_insert(0) += 1;
    }

    write_table(path, &table)?;

    let report = PaddingReport {
        columns,
        rows: table.rows.len(),
        padded,
        backup,
    };
    log::info!(
        "Padded {} of {} rows in {} to {} columns",
        report.total_padded(),
        report.rows,
        path.display(),
        columns
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use crate::schema::CARD_HEADER;

    use super::*;

    #[test]
    fn pads_monster_and_spell_rows_and_keeps_backup() {
        let dir = std::env::temp_dir().join(format!("ygo_db_tsv_migrate_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cards-all.tsv");

        let header = CARD_HEADER.join("\t");
        let monster = ["monster"; 21].join("\t");
        let spell = ["spell"; 22].join("\t");
        let trap = ["trap"; 23].join("\t");
        let original = format!("{header}\n{monster}\n{spell}\n{trap}\n");
        std::fs::write(&path, &original).unwrap();

        let report = pad_short_rows(&path).unwrap();
        assert_eq!(report.columns, 23);
        assert_eq!(report.rows, 3);
        assert_eq!(report.padded.get("monster"), Some(&1));
        assert_eq!(report.padded.get("spell"), Some(&1));
        assert_eq!(report.padded.get("trap"), None);
        assert_eq!(report.total_padded(), 2);

        let table = read_table(&path).unwrap();
        assert!(table.rows.iter().all(|r| r.len() == 23));
        assert_eq!(std::fs::read_to_string(&report.backup).unwrap(), original);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("ygo_db_tsv_migrate_missing.tsv");
        assert!(matches!(pad_short_rows(&path), Err(TsvError::Io { .. })));
    }
}
