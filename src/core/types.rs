//! Core types for slicing and transcoding settings.
//!
//! `*Settings` structs hold raw user input (defaults, a JSON settings file, CLI
//! flags). They become `*Config` values only after passing
//! [`crate::utils::validation`], so the processing code never sees an
//! unchecked width or quality.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::error::ValidationError;
use crate::utils::formats::OutputFormat;

/// Worker count used when neither the settings nor the OS say otherwise.
pub const DEFAULT_WORKERS: usize = 4;

/// Largest target width accepted; JPEG cannot encode wider images.
pub const MAX_TARGET_WIDTH: i64 = u16::MAX as i64;

/// Encoder quality, 1..=100. Fixed for the whole run once validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const SLICE_DEFAULT: Quality = Quality(85);
    pub const COMPRESS_DEFAULT: Quality = Quality(85);
    pub const CONVERT_DEFAULT: Quality = Quality(95);

    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if (1..=100).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::settings(format!(
                "Invalid quality value: {}. Must be between 1 and 100",
                value
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

/// Settings for the resize → stack → slice pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SliceSettings {
    /// Width every image is resized to; 0 keeps original sizes
    pub target_width: i64,
    /// Tile height in pixels; 0 or less saves each resized image on its own
    pub slice_height: i64,
    /// Output format for every file; `None` keeps the source format
    pub output_format: Option<String>,
    /// Encoder quality (1-100)
    pub quality: u32,
    /// Worker pool size; `None` uses the available parallelism
    pub workers: Option<usize>,
}

impl Default for SliceSettings {
    fn default() -> Self {
        Self {
            target_width: 800,
            slice_height: 600,
            output_format: None,
            quality: u32::from(Quality::SLICE_DEFAULT.get()),
            workers: None,
        }
    }
}

/// Settings for whole-file re-encoding (compress / convert).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeSettings {
    /// Target format; required for convert, ignored by compress
    pub output_format: Option<String>,
    /// Encoder quality (1-100)
    pub quality: u32,
    /// Worker pool size; `None` uses the available parallelism
    pub workers: Option<usize>,
}

impl TranscodeSettings {
    pub fn compress() -> Self {
        Self {
            output_format: None,
            quality: u32::from(Quality::COMPRESS_DEFAULT.get()),
            workers: None,
        }
    }

    pub fn convert(format: impl Into<String>) -> Self {
        Self {
            output_format: Some(format.into()),
            quality: u32::from(Quality::CONVERT_DEFAULT.get()),
            workers: None,
        }
    }
}

/// Validated configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    /// 0 means pass-through (no resize)
    pub target_width: u32,
    /// `None` selects the individual-save branch
    pub slice_height: Option<u32>,
    pub output_format: Option<OutputFormat>,
    pub quality: Quality,
    pub workers: usize,
}

/// What a transcode run does to each file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeMode {
    /// Re-encode in the source format (JPEG for anything untuned)
    Compress,
    /// Normalise to RGB and re-encode in the given format
    Convert(OutputFormat),
}

impl TranscodeMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Compress => "compress",
            Self::Convert(_) => "convert",
        }
    }
}

/// Validated configuration for one compress or convert run.
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub mode: TranscodeMode,
    pub quality: Quality,
    pub workers: usize,
}
