//! Progress reporting for crawls.
//!
//! Crawl loops report through [`ProgressCallback`] and never touch a
//! terminal directly. The CLI plugs in progress bars; tests and library
//! callers use [`null_progress`] or [`LogProgress`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives progress from a running crawl. Positions count fetched records
/// (or pages, for list crawls).
pub trait ProgressCallback: Send + Sync {
    /// Sets the expected total, when the crawl knows it up front.
    fn set_total(&self, total: u64);

    /// Sets the absolute position, e.g. after resuming from a checkpoint.
    fn set_position(&self, pos: u64);

    fn inc(&self, delta: u64);

    fn set_message(&self, msg: String);

    fn finish(&self, msg: String);

    fn finish_and_clear(&self);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn set_position(&self, _pos: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Writes a log line every `every` units instead of drawing a bar. Used
/// when stderr is not a terminal.
pub struct LogProgress {
    label: String,
    every: u64,
    total: AtomicU64,
    position: AtomicU64,
}

impl LogProgress {
    #[must_use]
    pub fn new(label: impl Into<String>, every: u64) -> Self {
        Self {
            label: label.into(),
            every: every.max(1),
            total: AtomicU64::new(0),
            position: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    fn report(&self, pos: u64) {
        let total = self.total.load(Ordering::Relaxed);
        if total > 0 {
            log::info!("{}: {pos}/{total}", self.label);
        } else {
            log::info!("{}: {pos}", self.label);
        }
    }
}

impl ProgressCallback for LogProgress {
    fn set_total(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    fn set_position(&self, pos: u64) {
        self.position.store(pos, Ordering::Relaxed);
    }

    fn inc(&self, delta: u64) {
        let before = self.position.fetch_add(delta, Ordering::Relaxed);
        let after = before + delta;
        if after / self.every > before / self.every {
            self.report(after);
        }
    }

    fn set_message(&self, msg: String) {
        log::debug!("{}: {msg}", self.label);
    }

    fn finish(&self, msg: String) {
        log::info!("{}: {msg}", self.label);
    }

    fn finish_and_clear(&self) {}
}
