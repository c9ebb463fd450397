//! In-memory, ID-indexed view of a dataset file.
//!
//! A [`Dataset`] is loaded fully, merged in memory, and written back as a
//! whole. Every id appears at most once. Incoming records always overwrite
//! an existing row with the same id (last write wins); rows not touched by
//! a run are kept unchanged.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use ygo_db_tsv::schema::field;
use ygo_db_tsv::{Table, TsvRecord, read_table_if_exists};

use crate::ReconcileError;

/// Row order used when a dataset is written back.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MergeOrder {
    /// Every row sorted by numeric id, largest (newest) first.
    DescendingId,
    /// Rows inserted by this run first, in insertion order, followed by the
    /// previous rows in their previous order. Replaced rows keep their
    /// position.
    PrependNew,
}

/// Result of a single upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// How an encountered record relates to the stored dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Change {
    /// The id is not in the dataset.
    New,
    /// The id is known and the incoming date is strictly later.
    Updated,
    /// The id is known and the incoming date is not later.
    Unchanged,
}

/// Counts from a batch merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub inserted: usize,
    pub replaced: usize,
}

/// Whether `incoming` is strictly later than `existing`.
///
/// Dates are compared lexically, which is correct for the `YYYY-MM-DD`
/// strings the site uses. A missing incoming date is never later; a present
/// incoming date is later than a missing or empty stored one.
#[must_use]
pub fn is_newer(incoming: Option<&str>, existing: Option<&str>) -> bool {
    let existing = existing.filter(|e| !e.is_empty());
    match (incoming.filter(|i| !i.is_empty()), existing) {
        (Some(i), Some(e)) => i > e,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// ID-indexed rows plus the bookkeeping needed to reproduce file order.
#[derive(Debug, Clone)]
pub struct Dataset {
    header: Vec<String>,
    id_index: usize,
    rows: HashMap<String, Vec<String>>,
    /// Ids loaded from disk, in file order.
    existing: Vec<String>,
    /// Ids inserted since load, in insertion order.
    inserted: Vec<String>,
}

impl Dataset {
    /// An empty dataset with the given header.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MissingIdColumn`] if `id_column` is not in
    /// `header`.
    pub fn new(header: &[&str], id_column: &str) -> Result<Self, ReconcileError> {
        let table = Table::new(header);
        Self::from_table(&table, header, id_column)
    }

    /// Loads a dataset file. A missing or empty file yields an empty
    /// dataset.
    ///
    /// `header` is the current column layout and is what gets written back.
    /// Rows from a file whose header is a prefix of `header` are kept as they
    /// are; any other layout is remapped by column name (see
    /// [`Dataset::from_table`]).
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Tsv`] if the file cannot be read and
    /// [`ReconcileError::MissingIdColumn`] if neither the file's header nor
    /// `header` has `id_column`.
    pub fn load(path: &Path, header: &[&str], id_column: &str) -> Result<Self, ReconcileError> {
        let table = read_table_if_exists(path)?.unwrap_or_default();
        let dataset = Self::from_table(&table, header, id_column).map_err(|e| match e {
            ReconcileError::MissingIdColumn { column, .. } => ReconcileError::MissingIdColumn {
                path: path.display().to_string(),
                column,
            },
            other => other,
        })?;
        log::info!("Loaded {} rows from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Loads the dataset for record kind `R`.
    ///
    /// # Errors
    ///
    /// Same as [`Dataset::load`].
    pub fn load_for<R: TsvRecord>(path: &Path) -> Result<Self, ReconcileError> {
        Self::load(path, R::HEADER, R::ID_COLUMN)
    }

    /// Builds a dataset from an already-read table.
    ///
    /// When the table's header is not a prefix of `header`, each row is
    /// rebuilt in `header` order by column name. Columns missing from the
    /// table read as empty; columns unknown to `header` are dropped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::MissingIdColumn`] if the id column cannot
    /// be located.
    pub fn from_table(
        table: &Table,
        header: &[&str],
        id_column: &str,
    ) -> Result<Self, ReconcileError> {
        let missing = || ReconcileError::MissingIdColumn {
            path: String::new(),
            column: id_column.to_owned(),
        };
        let id_index = header
            .iter()
            .position(|&h| h == id_column)
            .ok_or_else(missing)?;
        let file_id_index = if table.header.is_empty() {
            id_index
        } else {
            table.column_index(id_column).ok_or_else(missing)?
        };

        let remap = column_remap(&table.header, header);

        let mut dataset = Self {
            header: header.iter().map(|&h| h.to_owned()).collect(),
            id_index,
            rows: HashMap::with_capacity(table.rows.len()),
            existing: Vec::with_capacity(table.rows.len()),
            inserted: Vec::new(),
        };

        let mut duplicates = 0usize;
        for row in &table.rows {
            let id = field(row, file_id_index);
            if id.is_empty() {
                log::warn!("Dropping row without an id");
                continue;
            }
            if dataset.rows.contains_key(id) {
                duplicates += 1;
                continue;
            }
            let fields = match &remap {
                None => row.clone(),
                Some(map) => map
                    .iter()
                    .map(|index| index.map_or_else(String::new, |i| field(row, i).to_owned()))
                    .collect(),
            };
            dataset.existing.push(id.to_owned());
            dataset.rows.insert(id.to_owned(), fields);
        }
        if duplicates > 0 {
            log::warn!("Dropped {duplicates} duplicate rows (first occurrence kept)");
        }

        Ok(dataset)
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    /// Raw fields of the row with `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.rows.get(id).map(Vec::as_slice)
    }

    /// One field of the row with `id`, by column name. Short rows read as
    /// empty.
    #[must_use]
    pub fn field(&self, id: &str, column: &str) -> Option<&str> {
        let index = self.header.iter().position(|h| h == column)?;
        self.rows.get(id).map(|row| field(row, index))
    }

    /// Ids in the order [`MergeOrder::PrependNew`] would write them.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.inserted
            .iter()
            .chain(self.existing.iter())
            .map(String::as_str)
    }

    /// Inserts or replaces one row by id.
    pub fn upsert(&mut self, fields: Vec<String>) -> Option<Upsert> {
        let id = field(&fields, self.id_index).to_owned();
        if id.is_empty() {
            log::warn!("Ignoring record without an id");
            return None;
        }
        if self.rows.insert(id.clone(), fields).is_some() {
            Some(Upsert::Replaced)
        } else {
            self.inserted.push(id);
            Some(Upsert::Inserted)
        }
    }

    /// Inserts or replaces one record.
    pub fn upsert_record<R: TsvRecord>(&mut self, record: &R) -> Option<Upsert> {
        self.upsert(record.to_fields())
    }

    /// Merges a batch with last-write-wins semantics.
    pub fn merge<R: TsvRecord>(&mut self, records: &[R]) -> MergeSummary {
        let mut summary = MergeSummary::default();
        for record in records {
            match self.upsert_record(record) {
                Some(Upsert::Inserted) => summary.inserted += 1,
                Some(Upsert::Replaced) => summary.replaced += 1,
                None => {}
            }
        }
        summary
    }

    /// Classifies an incoming record against the stored row using the
    /// date in `date_column`.
    #[must_use]
    pub fn classify(&self, id: &str, date_column: &str, incoming_date: Option<&str>) -> Change {
        if !self.contains(id) {
            return Change::New;
        }
        if is_newer(incoming_date, self.field(id, date_column)) {
            Change::Updated
        } else {
            Change::Unchanged
        }
    }

    /// Stores `record` only if it is new or strictly newer than the stored
    /// row. Unchanged records leave the stored row as it was.
    pub fn merge_if_newer<R: TsvRecord>(
        &mut self,
        record: &R,
        date_column: &str,
        incoming_date: Option<&str>,
    ) -> Change {
        let change = self.classify(record.id(), date_column, incoming_date);
        if change != Change::Unchanged {
            self.upsert_record(record);
        }
        change
    }

    /// Renders the dataset as a table in the requested order.
    #[must_use]
    pub fn to_table(&self, order: MergeOrder) -> Table {
        let mut ids: Vec<&str> = self.ids().collect();
        if order == MergeOrder::DescendingId {
            ids.sort_by(|a, b| id_sort_key(b).cmp(&id_sort_key(a)));
        }
        Table {
            header: self.header.clone(),
            rows: ids
                .into_iter()
                .filter_map(|id| self.rows.get(id).cloned())
                .collect(),
        }
    }
}

/// Numeric ids sort by value; anything non-numeric sorts below every
/// numeric id, lexically.
fn id_sort_key(id: &str) -> (Option<u64>, &str) {
    (id.parse().ok(), id)
}

/// For each column of `header`, its position in `file_header`. `None` when
/// rows can be read positionally as they are.
fn column_remap(file_header: &[String], header: &[&str]) -> Option<Vec<Option<usize>>> {
    let is_prefix = file_header.len() <= header.len()
        && file_header.iter().zip(header).all(|(f, &h)| f == h);
    if is_prefix {
        return None;
    }

    let unknown: Vec<&str> = file_header
        .iter()
        .map(String::as_str)
        .filter(|f| !header.contains(f))
        .collect();
    if unknown.is_empty() {
        log::warn!("Dataset columns are out of order; remapping rows by column name");
    } else {
        log::warn!(
            "Dropping dataset columns not in the current layout: {}",
            unknown.join(", ")
        );
    }

    Some(
        header
            .iter()
            .map(|&h| file_header.iter().position(|f| f == h))
            .collect(),
    )
}
