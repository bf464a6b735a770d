// Module declarations in dependency order
pub mod commands;
pub mod core;
pub mod processing;
pub mod utils;
pub mod worker;

// Public exports for external consumers
pub use core::{
    PipelineConfig, Progress, ProgressType, Quality, RunReport, RunState, RunStatus, RunSummary,
    SliceSettings, TranscodeConfig, TranscodeSettings,
};
pub use processing::{Pipeline, TranscodeService, run_pipeline, run_transcode};
pub use utils::{SlicerError, SlicerResult};
pub use commands::*;

// The binary in main.rs is a thin CLI over this library.
