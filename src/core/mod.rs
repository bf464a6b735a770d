//! Core types and run state.
//!
//! This module contains the fundamental types used throughout the crate:
//! - [`SliceSettings`] / [`TranscodeSettings`]: raw user settings
//! - [`PipelineConfig`] / [`TranscodeConfig`]: validated run configuration
//! - [`RunState`]: counters and cancel flag shared with worker threads
//! - [`Progress`]: progress events for callers
//! - [`RunSummary`]: the end-of-run report

mod state;
mod types;
mod task;
mod progress;
mod report;

pub use state::{FailedImage, RunState};
pub use types::{
    DEFAULT_WORKERS, MAX_TARGET_WIDTH, PipelineConfig, Quality, SliceSettings, TranscodeConfig,
    TranscodeMode, TranscodeSettings,
};
pub use task::TranscodeTask;
pub use progress::{Progress, ProgressType, percentage};
pub use report::{RunReport, RunStatus, RunSummary};
