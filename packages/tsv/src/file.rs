//! Dataset file I/O.
//!
//! A dataset is a UTF-8 TSV file: one header row, then one row per record,
//! LF-terminated, no quoting. Fields are held in memory unescaped and are
//! escaped again on write.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::TsvError;
use crate::escape::{escape, unescape};
use crate::schema::{self, TsvRecord};

/// An in-memory dataset: header plus decoded rows.
///
/// Rows are kept as raw field lists so rows that no longer decode into a
/// record (or that were written by an older, narrower schema) survive a
/// read-modify-write cycle untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// An empty table with the given header.
    #[must_use]
    pub fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|&h| h.to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table for `R` from records, in order.
    #[must_use]
    pub fn from_records<R: TsvRecord>(records: &[R]) -> Self {
        Self {
            header: R::HEADER.iter().map(|&h| h.to_owned()).collect(),
            rows: records.iter().map(TsvRecord::to_fields).collect(),
        }
    }

    /// Position of a column by header name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// Non-empty values of a column, in row order. Short rows are skipped.
    #[must_use]
    pub fn column_values(&self, name: &str) -> Option<Vec<String>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| schema::field(row, index))
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// Decodes every row as `R`. Rows that fail to decode are logged and
    /// skipped.
    #[must_use]
    pub fn decode<R: TsvRecord>(&self) -> Vec<R> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| match R::from_fields(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::debug!("Skipping undecodable row {}: {e}", i + 1);
                    None
                }
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

fn io_error(path: &Path, source: std::io::Error) -> TsvError {
    TsvError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Reads a dataset from any reader. The first row is the header; an empty
/// input yields a table with no header and no rows.
///
/// # Errors
///
/// Returns [`TsvError::Csv`] if the input is not valid UTF-8 or cannot be
/// read.
pub fn read_table_from(reader: impl Read) -> Result<Table, TsvError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(false)
        .from_reader(reader);

    let mut table = Table::default();
    for (i, result) in csv_reader.records().enumerate() {
        let record = result?;
        let fields: Vec<String> = record.iter().map(unescape).collect();
        if i == 0 {
            table.header = fields;
        } else {
            table.rows.push(fields);
        }
    }

    Ok(table)
}

/// Reads a dataset file.
///
/// # Errors
///
/// Returns [`TsvError::Io`] if the file cannot be opened and
/// [`TsvError::Csv`] if it cannot be read.
pub fn read_table(path: &Path) -> Result<Table, TsvError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    read_table_from(file)
}

/// Reads a dataset file, returning `None` when it does not exist yet.
///
/// # Errors
///
/// Same as [`read_table`] for any failure other than a missing file.
pub fn read_table_if_exists(path: &Path) -> Result<Option<Table>, TsvError> {
    if !path.exists() {
        return Ok(None);
    }
    read_table(path).map(Some)
}

/// Writes a dataset to any writer, header first.
///
/// # Errors
///
/// Returns [`TsvError::Csv`] if writing fails.
pub fn write_table_to(writer: impl Write, table: &Table) -> Result<(), TsvError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(table.header.iter().map(|h| escape(h)))?;
    for row in &table.rows {
        csv_writer.write_record(row.iter().map(|f| escape(f)))?;
    }
    csv_writer.flush().map_err(|e| TsvError::Csv(e.into()))?;

    Ok(())
}

/// Writes a dataset file in place, creating parent directories.
///
/// This is a plain overwrite; callers that need the previous contents to
/// survive a crash write to a temporary path and rename.
///
/// # Errors
///
/// Returns [`TsvError::Io`] if the file or its parent directory cannot be
/// created and [`TsvError::Csv`] if writing fails.
pub fn write_table(path: &Path, table: &Table) -> Result<(), TsvError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    write_table_to(file, table)
}

/// `<file>.backup` next to `path`.
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

/// Copies `path` to its [`backup_path`], replacing any earlier backup.
///
/// # Errors
///
/// Returns [`TsvError::Io`] if the copy fails.
pub fn write_backup(path: &Path) -> Result<PathBuf, TsvError> {
    let backup = backup_path(path);
    std::fs::copy(path, &backup).map_err(|e| io_error(path, e))?;
    log::info!("Backed up {} to {}", path.display(), backup.display());
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use ygo_db_models::FaqEntry;

    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ygo_db_tsv_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn reads_header_and_unescapes_fields() {
        let input = "faqId\tquestion\tanswer\tupdatedAt\n1\tline\\nnext\ta\\tb\t2020-01-01\n";
        let table = read_table_from(input.as_bytes()).unwrap();
        assert_eq!(table.header, vec!["faqId", "question", "answer", "updatedAt"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "line\nnext");
        assert_eq!(table.rows[0][2], "a\tb");
    }

    #[test]
    fn tolerates_short_rows_and_blank_lines() {
        let input = "a\tb\tc\n1\t2\n\n3\t4\t5\n";
        let table = read_table_from(input.as_bytes()).unwrap();
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4", "5"]]);
        assert_eq!(table.column_values("c").unwrap(), vec!["5"]);
        assert_eq!(table.column_values("missing"), None);
    }

    #[test]
    fn empty_input_is_an_empty_table() {
        let table = read_table_from("".as_bytes()).unwrap();
        assert!(table.header.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn written_rows_contain_no_raw_control_characters() {
        let faq = FaqEntry {
            faq_id: "9".to_owned(),
            question: "q\twith tab".to_owned(),
            answer: "multi\nline\r".to_owned(),
            updated_at: Some("2021-01-01".to_owned()),
        };
        let table = Table::from_records(&[faq.clone()]);
        let mut out = Vec::new();
        write_table_to(&mut out, &table).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].split('\t').count(), 4);
        assert!(!text.contains('\r'));

        let back = read_table_from(text.as_bytes()).unwrap();
        assert_eq!(back.decode::<FaqEntry>(), vec![faq]);
    }

    #[test]
    fn file_round_trip_and_backup() {
        let dir = temp_dir("file_round_trip");
        let path = dir.join("data").join("faq-all.tsv");

        assert_eq!(read_table_if_exists(&path).unwrap(), None);

        let mut table = Table::new(&["faqId"]);
        table.rows.push(vec!["1".to_owned()]);
        write_table(&path, &table).unwrap();
        assert_eq!(read_table(&path).unwrap(), table);

        let backup = write_backup(&path).unwrap();
        assert!(backup.to_string_lossy().ends_with("faq-all.tsv.backup"));
        assert_eq!(read_table(&backup).unwrap(), table);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
