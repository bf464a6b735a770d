//! Resize stage: decode every file of a group and scale it to the target width.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::{debug, warn};

use crate::core::RunState;
use crate::processing::codec;
use crate::utils::{SlicerError, SlicerResult};
use crate::worker::{TaskOutcome, WorkerError, WorkerPool};

/// Resampling kernel used for every resize.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// A decoded image at its final width, owned until the assembler takes it.
#[derive(Debug)]
pub struct ResizedImage {
    pub source: PathBuf,
    pub image: DynamicImage,
}

/// Result of resizing one file, in the same slot as its input.
#[derive(Debug)]
pub enum ResizeSlot {
    Resized(ResizedImage),
    Failed { source: PathBuf, error: SlicerError },
    /// Cancellation was seen before this file started
    Skipped(PathBuf),
}

impl ResizeSlot {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Height that keeps the aspect ratio at `target_width`, rounded to nearest
/// and never below one pixel.
pub fn resized_height(original_width: u32, original_height: u32, target_width: u32) -> u32 {
    let scaled = f64::from(target_width) / f64::from(original_width) * f64::from(original_height);
    scaled.round().max(1.0) as u32
}

/// Scales `image` to `target_width`; a target of 0 passes it through untouched.
pub fn resize_image(image: DynamicImage, target_width: u32) -> SlicerResult<DynamicImage> {
    if target_width == 0 {
        return Ok(image);
    }
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(SlicerError::encode(format!(
            "Cannot resize an empty {width}×{height} image"
        )));
    }

    let new_height = resized_height(width, height, target_width);
    if (width, height) == (target_width, new_height) {
        return Ok(image);
    }
    Ok(image.resize_exact(target_width, new_height, RESIZE_FILTER))
}

/// Decodes `path` and resizes it.
pub fn load_and_resize(path: &Path, target_width: u32) -> SlicerResult<DynamicImage> {
    let image = codec::decode(path)?;
    resize_image(image, target_width)
}

/// Resizes every file of a group on the pool.
///
/// Returns one slot per input, in input order regardless of which worker
/// finished first. Failed files are recorded in `state` and do not stop the
/// rest of the group.
pub fn resize_group(
    pool: &WorkerPool,
    files: &[PathBuf],
    target_width: u32,
    state: &RunState,
) -> Vec<ResizeSlot> {
    let outcomes = pool.run_indexed(files.to_vec(), state, |path: PathBuf| {
        let result = load_and_resize(&path, target_width);
        (path, result)
    });

    outcomes
        .into_iter()
        .zip(files)
        .map(|(outcome, source)| match outcome {
            TaskOutcome::Completed((path, Ok(image))) => {
                debug!("Resized '{}' to {}×{}", path.display(), image.width(), image.height());
                ResizeSlot::Resized(ResizedImage { source: path, image })
            }
            TaskOutcome::Completed((path, Err(error))) => {
                warn!("Failed to resize {}: {}", path.display(), error);
                state.record_failure(&path, format!("{}: {}", error.kind(), error));
                ResizeSlot::Failed { source: path, error }
            }
            TaskOutcome::Panicked(message) => {
                let error = SlicerError::from(WorkerError::TaskPanicked(message));
                warn!("Failed to resize {}: {}", source.display(), error);
                state.record_failure(source, format!("{}: {}", error.kind(), error));
                ResizeSlot::Failed {
                    source: source.clone(),
                    error,
                }
            }
            TaskOutcome::Skipped => ResizeSlot::Skipped(source.clone()),
        })
        .collect()
}
