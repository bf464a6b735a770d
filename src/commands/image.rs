//! Command handlers for slicing and transcoding.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::core::{Progress, ProgressType, RunState, RunSummary, SliceSettings, TranscodeSettings};
use crate::processing::{run_pipeline, run_transcode};
use crate::utils::{
    SlicerError, SlicerResult, ValidationError, validate_compress_settings,
    validate_convert_settings, validate_slice_settings,
};

/// Resizes, stacks and slices every image group under `source` into `dest`.
///
/// Settings are validated before anything touches the disk; an invalid
/// configuration returns [`SlicerError::Validation`] and no work is done.
/// Per-file failures do not fail the command, they show up in the summary.
pub fn slice_images(
    source: &Path,
    dest: &Path,
    settings: &SliceSettings,
    state: &RunState,
    on_progress: impl FnMut(&Progress),
) -> SlicerResult<RunSummary> {
    debug!("Received slice command for {}", source.display());
    let config = validate_slice_settings(source, dest, settings)?;
    run_pipeline(config, state, on_progress)
}

/// Re-encodes every image under `source` in its own format (JPEG for formats
/// without tuned parameters). `dest` defaults to `<source>-optimized`.
pub fn compress_images(
    source: &Path,
    dest: Option<&Path>,
    settings: &TranscodeSettings,
    state: &RunState,
    on_progress: impl FnMut(&Progress),
) -> SlicerResult<RunSummary> {
    debug!("Received compress command for {}", source.display());
    let config = validate_compress_settings(source, dest, settings)?;
    run_transcode(config, state, on_progress)
}

/// Converts every image under `source` to the requested format.
/// `dest` defaults to `<source>-converted`.
pub fn convert_images(
    source: &Path,
    dest: Option<&Path>,
    settings: &TranscodeSettings,
    state: &RunState,
    on_progress: impl FnMut(&Progress),
) -> SlicerResult<RunSummary> {
    debug!("Received convert command for {}", source.display());
    let config = validate_convert_settings(source, dest, settings)?;
    run_transcode(config, state, on_progress)
}

/// Reads settings from a JSON file, or returns the defaults without one.
/// Fields missing from the file keep their defaults.
pub fn load_settings<T>(path: Option<&Path>) -> SlicerResult<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };
    let raw = fs::read_to_string(path).map_err(|e| {
        SlicerError::Validation(ValidationError::settings(format!(
            "Cannot read settings file {}: {}",
            path.display(),
            e
        )))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        SlicerError::Validation(ValidationError::settings(format!(
            "Invalid settings file {}: {}",
            path.display(),
            e
        )))
    })
}

/// Progress sink that writes events to the log.
pub fn log_progress(progress: &Progress) {
    match progress.progress_type {
        ProgressType::Start => {
            info!("Found {} images", progress.total_images)
        }
        ProgressType::Progress => info!(
            "[{:>5.1}%] {} ({}/{})",
            progress.progress_percentage,
            progress.status,
            progress.processed_images,
            progress.total_images
        ),
        ProgressType::Complete | ProgressType::Cancelled => {
            debug!("{} at {:.1}%", progress.status, progress.progress_percentage)
        }
    }
}
