//! Shared run state.
//!
//! One [`RunState`] exists per run. The orchestrator and the pool borrow it
//! as `&RunState`; a caller that cancels from another thread wraps it in an
//! `Arc`. It only exposes atomic increment / read / set operations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

use crate::utils::formats::extension_of;

/// A source image that did not make it to the output, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Counters and the cancel flag for one run.
#[derive(Debug, Default)]
pub struct RunState {
    success_count: AtomicUsize,
    failure_count: AtomicUsize,
    processed_count: AtomicUsize,
    cancelled: AtomicBool,
    failed_images: Mutex<BTreeMap<PathBuf, String>>,
    extension_counts: Mutex<BTreeMap<String, usize>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cooperative cancellation. Never reset for the rest of the run.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Counts `path` as written successfully.
    pub fn record_success(&self, path: &Path) {
        self.success_count.fetch_add(1, Ordering::AcqRel);
        let ext = extension_of(path)
            .map(|e| format!(".{e}"))
            .unwrap_or_else(|| "(none)".to_string());
        *self.extension_counts.lock().entry(ext).or_insert(0) += 1;
    }

    /// Counts `path` as failed. A path is only ever counted once; a later
    /// failure for the same path keeps the first reason.
    pub fn record_failure(&self, path: &Path, reason: impl Into<String>) {
        let mut failed = self.failed_images.lock();
        if !failed.contains_key(path) {
            failed.insert(path.to_path_buf(), reason.into());
            self.failure_count.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Adds `count` finished images and returns the new total.
    pub fn add_processed(&self, count: usize) -> usize {
        self.processed_count.fetch_add(count, Ordering::AcqRel) + count
    }

    pub fn success_count(&self) -> usize {
        self.success_count.load(Ordering::Acquire)
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count.load(Ordering::Acquire)
    }

    pub fn processed_count(&self) -> usize {
        self.processed_count.load(Ordering::Acquire)
    }

    /// Failed images sorted by path.
    pub fn failed_images(&self) -> Vec<FailedImage> {
        self.failed_images
            .lock()
            .iter()
            .map(|(path, reason)| FailedImage {
                path: path.clone(),
                reason: reason.clone(),
            })
            .collect()
    }

    /// Successful images per source extension (`".jpg"` → 3).
    pub fn extension_counts(&self) -> BTreeMap<String, usize> {
        self.extension_counts.lock().clone()
    }
}
