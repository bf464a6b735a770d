use std::path::{Path, PathBuf};

use crate::core::{
    DEFAULT_WORKERS, MAX_TARGET_WIDTH, PipelineConfig, Quality, SliceSettings, TranscodeConfig,
    TranscodeMode, TranscodeSettings,
};
use crate::utils::error::ValidationError;
use crate::utils::formats::OutputFormat;
use crate::utils::fs::sibling_dir;

/// Validates slice settings and turns them into a run configuration.
pub fn validate_slice_settings(
    source_root: &Path,
    dest_root: &Path,
    settings: &SliceSettings,
) -> Result<PipelineConfig, ValidationError> {
    validate_source_root(source_root)?;
    validate_dest_root(source_root, dest_root)?;

    if settings.target_width < 0 {
        return Err(ValidationError::settings(format!(
            "Width cannot be negative: {}",
            settings.target_width
        )));
    }
    if settings.target_width > MAX_TARGET_WIDTH {
        return Err(ValidationError::settings(format!(
            "Width {} exceeds the maximum of {}",
            settings.target_width, MAX_TARGET_WIDTH
        )));
    }

    // Zero or negative slice height is the "save individually" branch, not an error.
    let slice_height = if settings.slice_height > 0 {
        let height = u32::try_from(settings.slice_height).map_err(|_| {
            ValidationError::settings(format!("Slice height too large: {}", settings.slice_height))
        })?;
        Some(height)
    } else {
        None
    };

    let output_format = settings
        .output_format
        .as_deref()
        .map(OutputFormat::requested)
        .transpose()?;

    Ok(PipelineConfig {
        source_root: source_root.to_path_buf(),
        dest_root: dest_root.to_path_buf(),
        target_width: settings.target_width as u32,
        slice_height,
        output_format,
        quality: validate_quality(settings.quality)?,
        workers: validate_workers(settings.workers)?,
    })
}

/// Validates compress settings. The destination defaults to `<source>-optimized`.
pub fn validate_compress_settings(
    source_root: &Path,
    dest_root: Option<&Path>,
    settings: &TranscodeSettings,
) -> Result<TranscodeConfig, ValidationError> {
    validate_transcode(source_root, dest_root, "-optimized", TranscodeMode::Compress, settings)
}

/// Validates convert settings. A target format is mandatory; the destination
/// defaults to `<source>-converted`.
pub fn validate_convert_settings(
    source_root: &Path,
    dest_root: Option<&Path>,
    settings: &TranscodeSettings,
) -> Result<TranscodeConfig, ValidationError> {
    let format = settings
        .output_format
        .as_deref()
        .ok_or_else(|| ValidationError::settings("Convert requires an output format"))?;
    let mode = TranscodeMode::Convert(OutputFormat::requested(format)?);
    validate_transcode(source_root, dest_root, "-converted", mode, settings)
}

fn validate_transcode(
    source_root: &Path,
    dest_root: Option<&Path>,
    default_suffix: &str,
    mode: TranscodeMode,
    settings: &TranscodeSettings,
) -> Result<TranscodeConfig, ValidationError> {
    validate_source_root(source_root)?;
    let dest_root = dest_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling_dir(source_root, default_suffix));
    validate_dest_root(source_root, &dest_root)?;

    Ok(TranscodeConfig {
        source_root: source_root.to_path_buf(),
        dest_root,
        mode,
        quality: validate_quality(settings.quality)?,
        workers: validate_workers(settings.workers)?,
    })
}

/// Source root must exist and be a directory.
pub fn validate_source_root(path: &Path) -> Result<(), ValidationError> {
    if !path.exists() {
        return Err(ValidationError::path_not_found(path));
    }
    if !path.is_dir() {
        return Err(ValidationError::not_a_directory(path));
    }
    Ok(())
}

/// Destination must not be the source root or anywhere beneath it, otherwise
/// a rerun would pick up its own output.
pub fn validate_dest_root(source_root: &Path, dest_root: &Path) -> Result<(), ValidationError> {
    let source = absolute(source_root);
    let dest = absolute(dest_root);
    if dest == source || dest.starts_with(&source) {
        return Err(ValidationError::settings(format!(
            "Output directory {} must be outside the source directory {}",
            dest_root.display(),
            source_root.display()
        )));
    }
    if dest.exists() && !dest.is_dir() {
        return Err(ValidationError::not_a_directory(dest_root));
    }
    Ok(())
}

fn validate_quality(quality: u32) -> Result<Quality, ValidationError> {
    let value = u8::try_from(quality).map_err(|_| {
        ValidationError::settings(format!(
            "Invalid quality value: {}. Must be between 1 and 100",
            quality
        ))
    })?;
    Quality::new(value)
}

fn validate_workers(workers: Option<usize>) -> Result<usize, ValidationError> {
    match workers {
        Some(0) => Err(ValidationError::settings("Worker count cannot be 0")),
        Some(count) => Ok(count),
        None => Ok(std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(DEFAULT_WORKERS)),
    }
}

/// Best-effort absolute form used only for containment checks.
fn absolute(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
