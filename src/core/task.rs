//! Transcode task definition and creation.

use std::path::{Path, PathBuf};

use crate::core::{Quality, TranscodeMode};
use crate::utils::formats::{ImageFormat, OutputFormat};
use crate::utils::fs::file_stem;
use crate::utils::ValidationError;

/// Represents a single whole-file re-encode.
///
/// Contains the input path, the directory the result lands in and the
/// resolved codec settings.
#[derive(Debug, Clone)]
pub struct TranscodeTask {
    /// Path to the source image file
    pub input_path: PathBuf,
    /// Directory the re-encoded file is written into
    pub output_dir: PathBuf,
    /// Target format; `None` re-encodes in the source format
    pub format: Option<OutputFormat>,
    pub quality: Quality,
    /// Flatten to RGB before encoding
    pub normalize_rgb: bool,
}

impl TranscodeTask {
    /// Builds the task for `input_path` under the given run mode.
    pub fn new(input_path: &Path, output_dir: &Path, mode: &TranscodeMode, quality: Quality) -> Self {
        let (format, normalize_rgb) = match mode {
            TranscodeMode::Compress => (None, false),
            TranscodeMode::Convert(format) => (Some(format.clone()), true),
        };
        Self {
            input_path: input_path.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            format,
            quality,
            normalize_rgb,
        }
    }

    /// Format and extension the output will be written with.
    ///
    /// Without an explicit format the source's own format is kept when it is
    /// JPEG, PNG or WEBP; anything else is re-encoded as JPEG under `.jpg`.
    pub fn resolve_output(&self) -> Result<OutputFormat, ValidationError> {
        if let Some(format) = &self.format {
            return Ok(format.clone());
        }
        let mut source = OutputFormat::of_source(&self.input_path)?;
        if source.format.is_tuned() {
            // Kept formats keep the file name byte for byte, extension case included.
            if let Some(extension) = self.input_path.extension().and_then(|e| e.to_str()) {
                source.extension = extension.to_string();
            }
            Ok(source)
        } else {
            Ok(OutputFormat {
                format: ImageFormat::Jpeg,
                extension: "jpg".to_string(),
            })
        }
    }

    /// Full output path for this task.
    pub fn output_path(&self) -> Result<PathBuf, ValidationError> {
        let format = self.resolve_output()?;
        Ok(self.output_dir.join(format.file_name(&file_stem(&self.input_path))))
    }
}
