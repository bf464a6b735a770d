use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::Quality;
use crate::utils::error::ValidationError;

/// Extensions (lowercase, without the dot) the directory walk picks up.
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "tiff", "gif", "webp"];

/// Whether `path` has one of the [`SUPPORTED_EXTENSIONS`], case-insensitively.
pub fn is_supported_image(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Lowercase extension of `path`, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Bmp,
    Tiff,
    Gif,
}

impl ImageFormat {
    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &[&str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg"],
            Self::Png => &["png"],
            Self::WebP => &["webp"],
            Self::Bmp => &["bmp"],
            Self::Tiff => &["tiff", "tif"],
            Self::Gif => &["gif"],
        }
    }

    /// Check if the extension matches this format
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.extensions().contains(&ext.as_str())
    }

    /// Get the primary extension for this format
    pub fn primary_extension(&self) -> &str {
        self.extensions()[0]
    }

    /// Formats that get tuned encoder parameters; everything else is written
    /// with the codec's defaults.
    pub fn is_tuned(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::WebP)
    }

    /// Format implied by the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, ValidationError> {
        let ext = extension_of(path).ok_or_else(|| {
            ValidationError::settings(format!("File has no extension: {}", path.display()))
        })?;
        Self::from_str(&ext)
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
            Self::Gif => image::ImageFormat::Gif,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::WebP => "WEBP",
            Self::Bmp => "BMP",
            Self::Tiff => "TIFF",
            Self::Gif => "GIF",
        };
        f.write_str(name)
    }
}

impl FromStr for ImageFormat {
    type Err = ValidationError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        let ext = ext.trim().trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            "gif" => Ok(Self::Gif),
            _ => Err(ValidationError::settings(format!(
                "Unsupported image format: {}",
                ext
            ))),
        }
    }
}

/// A codec choice paired with the exact extension its files are written under.
///
/// The extension is kept verbatim (`jpg` and `jpeg` both stay as given)
/// so output names follow the user's request or the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    pub format: ImageFormat,
    pub extension: String,
}

impl OutputFormat {
    /// Parses an explicitly requested format such as `"jpeg"` or `"WEBP"`.
    pub fn requested(name: &str) -> Result<Self, ValidationError> {
        let format = ImageFormat::from_str(name)?;
        let extension = name.trim().trim_start_matches('.').to_lowercase();
        Ok(Self { format, extension })
    }

    /// Format and extension taken from a source file.
    pub fn of_source(path: &Path) -> Result<Self, ValidationError> {
        let format = ImageFormat::from_path(path)?;
        let extension = extension_of(path).unwrap_or_else(|| format.primary_extension().to_string());
        Ok(Self { format, extension })
    }

    /// `requested` when present, else the format of `source`.
    pub fn resolve(requested: Option<&OutputFormat>, source: &Path) -> Result<Self, ValidationError> {
        match requested {
            Some(format) => Ok(format.clone()),
            None => Self::of_source(source),
        }
    }

    /// `<stem>.<extension>` for the given stem.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.extension)
    }
}

/// PNG zlib level derived from quality.
///
/// Inverse on purpose: higher requested quality yields a *lower* level
/// (faster, larger output). `clamp(0, 9, round(9 - quality / 11.111))`.
pub fn png_compression_level(quality: Quality) -> u8 {
    let level = (9.0 - f64::from(quality.get()) / 11.111).round();
    level.clamp(0.0, 9.0) as u8
}

/// PNG encoder setting for a 0..=9 zlib level; 0 writes stored blocks.
pub fn png_compression_type(level: u8) -> image::codecs::png::CompressionType {
    use image::codecs::png::CompressionType;
    match level {
        0 => CompressionType::Uncompressed,
        level => CompressionType::Level(level.min(9)),
    }
}
