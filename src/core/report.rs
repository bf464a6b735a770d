//! End-of-run summary and its human-readable rendering.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::core::state::{FailedImage, RunState};

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Counts and failures of one finished (or cancelled) run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub operation: String,
    pub status: RunStatus,
    pub total_images: usize,
    pub processed_images: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub groups_completed: usize,
    pub extension_counts: BTreeMap<String, usize>,
    pub failed_images: Vec<FailedImage>,
    pub elapsed_secs: f64,
}

impl RunSummary {
    /// Snapshots `state` into a summary.
    pub fn from_state(
        operation: &str,
        status: RunStatus,
        total_images: usize,
        groups_completed: usize,
        elapsed: Duration,
        state: &RunState,
    ) -> Self {
        Self {
            operation: operation.to_string(),
            status,
            total_images,
            processed_images: state.processed_count(),
            success_count: state.success_count(),
            failure_count: state.failure_count(),
            groups_completed,
            extension_counts: state.extension_counts(),
            failed_images: state.failed_images(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    /// Writes the report through `tracing`, failures at warn level.
    pub fn log(&self) {
        for line in RunReport::new(self).to_string().lines() {
            info!("{line}");
        }
        for failed in &self.failed_images {
            warn!("Failed: {} ({})", failed.path.display(), failed.reason);
        }
    }
}

/// Display adapter for a [`RunSummary`].
pub struct RunReport<'a> {
    summary: &'a RunSummary,
}

impl<'a> RunReport<'a> {
    pub fn new(summary: &'a RunSummary) -> Self {
        Self { summary }
    }
}

impl fmt::Display for RunReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.summary;
        let outcome = match s.status {
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
        };
        writeln!(f, "=== {} {} in {:.2}s ===", s.operation, outcome, s.elapsed_secs)?;
        writeln!(f, "- Images found: {}", s.total_images)?;
        writeln!(f, "- Images processed: {}", s.processed_images)?;
        writeln!(f, "- Groups completed: {}", s.groups_completed)?;
        writeln!(f, "- Succeeded: {}", s.success_count)?;
        writeln!(f, "- Failed: {}", s.failure_count)?;

        if !s.extension_counts.is_empty() {
            writeln!(f, "- By type:")?;
            for (ext, count) in &s.extension_counts {
                writeln!(f, "  └── {}: {}", ext, count)?;
            }
        }

        if !s.failed_images.is_empty() {
            writeln!(f, "- Failed files:")?;
            for failed in &s.failed_images {
                writeln!(f, "  └── {}", failed.path.display())?;
            }
        }
        Ok(())
    }
}
