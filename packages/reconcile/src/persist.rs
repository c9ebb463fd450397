//! Writing datasets back to disk: atomic rewrite, backups, and crawl
//! checkpoints.

use std::path::{Path, PathBuf};

use ygo_db_tsv::file::{write_backup, write_table};

use crate::ReconcileError;
use crate::dataset::{Dataset, MergeOrder};

fn io_error(path: &Path, source: std::io::Error) -> ReconcileError {
    ReconcileError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// `<dir>/.<name>.tmp` next to `path`.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Writes `table` to a temporary sibling of `path`, then renames it over
/// `path`. Readers never see a half-written dataset.
///
/// # Errors
///
/// Returns [`ReconcileError::Tsv`] if the temporary file cannot be written
/// and [`ReconcileError::Io`] if the rename fails.
pub fn write_atomic(path: &Path, table: &ygo_db_tsv::Table) -> Result<(), ReconcileError> {
    let tmp = temp_path(path);
    write_table(&tmp, table)?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        io_error(path, e)
    })
}

impl Dataset {
    /// Rewrites the dataset file wholesale in `order`.
    ///
    /// # Errors
    ///
    /// See [`write_atomic`].
    pub fn save(&self, path: &Path, order: MergeOrder) -> Result<(), ReconcileError> {
        write_atomic(path, &self.to_table(order))?;
        log::info!(
            "Wrote {} rows to {} ({order})",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Copies the current file to `<file>.backup` (when it exists), then
    /// saves. Used by targeted id updates.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Tsv`] if the backup fails, otherwise see
    /// [`Dataset::save`].
    pub fn save_with_backup(&self, path: &Path, order: MergeOrder) -> Result<(), ReconcileError> {
        if path.exists() {
            write_backup(path)?;
        }
        self.save(path, order)
    }
}

// ── Checkpoints ──────────────────────────────────────────────────────

/// `<dir>/<stem>.checkpoint-<index>.tsv` for the dataset at `path`.
#[must_use]
pub fn checkpoint_path(path: &Path, index: usize) -> PathBuf {
    path.with_file_name(format!("{}.checkpoint-{index}.tsv", stem(path)))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Every checkpoint on disk for `path`, as `(index, path)`, unordered.
fn list_checkpoints(path: &Path) -> Result<Vec<(usize, PathBuf)>, ReconcileError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = format!("{}.checkpoint-", stem(path));
    let entries = std::fs::read_dir(&dir).map_err(|e| io_error(&dir, e))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error(&dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(rest) = name.strip_prefix(&prefix)
            && let Some(index) = rest.strip_suffix(".tsv")
            && let Ok(index) = index.parse::<usize>()
        {
            found.push((index, entry.path()));
        }
    }
    Ok(found)
}

/// Saves the merged-so-far dataset as checkpoint `index`.
///
/// # Errors
///
/// See [`write_atomic`].
pub fn write_checkpoint(
    dataset: &Dataset,
    path: &Path,
    index: usize,
    order: MergeOrder,
) -> Result<PathBuf, ReconcileError> {
    let checkpoint = checkpoint_path(path, index);
    write_atomic(&checkpoint, &dataset.to_table(order))?;
    log::info!("Checkpoint {index} saved to {}", checkpoint.display());
    Ok(checkpoint)
}

/// The newest checkpoint whose index is `<= at_most`.
///
/// # Errors
///
/// Returns [`ReconcileError::Io`] if the dataset directory cannot be read.
pub fn find_checkpoint(
    path: &Path,
    at_most: usize,
) -> Result<Option<(usize, PathBuf)>, ReconcileError> {
    Ok(list_checkpoints(path)?
        .into_iter()
        .filter(|(index, _)| *index <= at_most)
        .max_by_key(|(index, _)| *index))
}

/// Deletes every checkpoint for `path`. Returns how many were removed.
///
/// # Errors
///
/// Returns [`ReconcileError::Io`] if listing or deleting fails.
pub fn remove_checkpoints(path: &Path) -> Result<usize, ReconcileError> {
    let checkpoints = list_checkpoints(path)?;
    for (_, checkpoint) in &checkpoints {
        std::fs::remove_file(checkpoint).map_err(|e| io_error(checkpoint, e))?;
    }
    if !checkpoints.is_empty() {
        log::debug!("Removed {} checkpoints for {}", checkpoints.len(), path.display());
    }
    Ok(checkpoints.len())
}
