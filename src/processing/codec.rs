//! Decodes source images and encodes bitmaps with quality-derived settings.
//!
//! One quality scalar drives every format:
//! - JPEG: flattened to RGB, progressive scans, optimized Huffman tables.
//! - PNG: adaptive filtering, zlib level from [`png_compression_level`].
//! - WEBP: lossy at the given quality.
//! - BMP / TIFF / GIF: the codec's defaults.
//!
//! Failures come back as [`SlicerError::Decode`] or [`SlicerError::Encode`];
//! nothing in here panics past its boundary.

use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use image::codecs::png::{FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ImageReader, RgbImage};
use tracing::debug;

use crate::core::Quality;
use crate::utils::formats::{ImageFormat, png_compression_level, png_compression_type};
use crate::utils::fs::write_file;
use crate::utils::{SlicerError, SlicerResult, extract_filename};

type Result<T> = SlicerResult<T>;

/// Decodes the image at `path`, sniffing the format from its content.
pub fn decode(path: &Path) -> Result<DynamicImage> {
    let mut reader = ImageReader::open(path)
        .map_err(|e| SlicerError::decode(path, e.to_string()))?
        .with_guessed_format()
        .map_err(|e| SlicerError::decode(path, e.to_string()))?;
    // Scans and strips are routinely larger than the default allocation limit.
    reader.no_limits();
    let image = reader
        .decode()
        .map_err(|e| SlicerError::decode(path, e.to_string()))?;

    debug!(
        "Loaded '{}': {}×{}",
        extract_filename(path),
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Encodes `image` as `format` into memory.
pub fn encode(image: &DynamicImage, format: ImageFormat, quality: Quality) -> Result<Vec<u8>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(SlicerError::encode(format!(
            "Cannot encode an empty {}×{} image",
            image.width(),
            image.height()
        )));
    }

    match format {
        ImageFormat::Jpeg => encode_jpeg(&image.to_rgb8(), quality),
        ImageFormat::Png => encode_png(image, quality),
        ImageFormat::WebP => encode_webp(image, quality),
        ImageFormat::Bmp | ImageFormat::Tiff | ImageFormat::Gif => encode_plain(image, format),
    }
}

/// Encodes `image` and writes it to `target`, creating parent directories.
pub fn save(image: &DynamicImage, target: &Path, format: ImageFormat, quality: Quality) -> Result<()> {
    let bytes = encode(image, format, quality)?;
    write_file(target, &bytes)?;
    debug!("Saved '{}' ({} bytes)", target.display(), bytes.len());
    Ok(())
}

fn encode_jpeg(rgb: &RgbImage, quality: Quality) -> Result<Vec<u8>> {
    let (width, height) = rgb.dimensions();
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(SlicerError::encode(format!(
            "JPEG cannot hold {width}×{height} pixels"
        )));
    }

    // libjpeg reports fatal errors by unwinding.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
        let mut compress = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        compress.set_size(width as usize, height as usize);
        compress.set_quality(f32::from(quality.get()));
        compress.set_progressive_mode();
        compress.set_optimize_coding(true);

        let mut started = compress.start_compress(Vec::new())?;
        started.write_scanlines(rgb.as_raw())?;
        started.finish()
    }));

    match outcome {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(SlicerError::encode(format!("JPEG encode failed: {e}"))),
        Err(_) => Err(SlicerError::encode("JPEG encoder aborted")),
    }
}

fn encode_png(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>> {
    let level = png_compression_level(quality);
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut bytes,
        png_compression_type(level),
        PngFilter::Adaptive,
    );
    image
        .write_with_encoder(encoder)
        .map_err(|e| SlicerError::encode(format!("PNG encode failed: {e}")))?;
    Ok(bytes)
}

fn encode_webp(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>> {
    let rgba = image.to_rgba8();
    let memory = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
        .encode_simple(false, f32::from(quality.get()))
        .map_err(|e| SlicerError::encode(format!("WebP encode failed: {e:?}")))?;
    Ok(memory.to_vec())
}

fn encode_plain(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    // BMP and GIF writers only take 8-bit samples.
    let normalized;
    let image = match format {
        ImageFormat::Gif => {
            normalized = DynamicImage::ImageRgba8(image.to_rgba8());
            &normalized
        }
        ImageFormat::Bmp if image.color().has_alpha() => {
            normalized = DynamicImage::ImageRgba8(image.to_rgba8());
            &normalized
        }
        ImageFormat::Bmp => {
            normalized = DynamicImage::ImageRgb8(image.to_rgb8());
            &normalized
        }
        _ => image,
    };

    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, format.to_image_format())
        .map_err(|e| SlicerError::encode(format!("{format} encode failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn q(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn jpeg_is_progressive() {
        let bytes = encode(&gradient(64, 48), ImageFormat::Jpeg, q(85)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        // SOF2 marks a progressive frame.
        assert!(bytes.windows(2).any(|w| w == [0xFF, 0xC2]));

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn jpeg_flattens_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 0])));
        let bytes = encode(&rgba, ImageFormat::Jpeg, q(90)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn png_is_lossless_at_any_quality() {
        let source = gradient(40, 30);
        for quality in [1, 50, 100] {
            let bytes = encode(&source, ImageFormat::Png, q(quality)).unwrap();
            assert_eq!(&bytes[1..4], b"PNG");
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.to_rgb8(), source.to_rgb8());
        }
    }

    #[test]
    fn png_size_follows_quality_level() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, y| {
            Rgb([(x ^ y) as u8, (x.wrapping_mul(y) >> 3) as u8, ((x + 3 * y) % 97) as u8])
        }));
        let raw_len = 256 * 256 * 3;

        // Levels 0, 1 and 2.
        let stored = encode(&source, ImageFormat::Png, q(100)).unwrap();
        let fast = encode(&source, ImageFormat::Png, q(85)).unwrap();
        let level_two = encode(&source, ImageFormat::Png, q(78)).unwrap();

        assert_ne!(stored, fast);
        assert_ne!(fast, level_two);
        assert_ne!(stored, level_two);
        // Stored deflate blocks: raw rows plus filter bytes and framing.
        assert!(stored.len() >= raw_len, "level 0 compressed to {}", stored.len());
        assert!(stored.len() < raw_len + raw_len / 10);
        assert!(fast.len() < stored.len());
        for bytes in [&stored, &fast, &level_two] {
            let decoded = image::load_from_memory(bytes).unwrap();
            assert_eq!(decoded.to_rgb8(), source.to_rgb8());
        }
    }

    #[test]
    fn webp_is_riff_container() {
        let bytes = encode(&gradient(32, 32), ImageFormat::WebP, q(80)).unwrap();
        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn other_formats_use_plain_writers() {
        let bmp = encode(&gradient(10, 10), ImageFormat::Bmp, q(85)).unwrap();
        assert_eq!(&bmp[..2], b"BM");
        let gif = encode(&gradient(10, 10), ImageFormat::Gif, q(85)).unwrap();
        assert_eq!(&gif[..3], b"GIF");
        let tiff = encode(&gradient(10, 10), ImageFormat::Tiff, q(85)).unwrap();
        assert!(&tiff[..2] == b"II" || &tiff[..2] == b"MM");
    }

    #[test]
    fn empty_image_is_an_encode_error() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        let err = encode(&empty, ImageFormat::Png, q(85)).unwrap_err();
        assert!(matches!(err, SlicerError::Encode(_)));
    }

    #[test]
    fn corrupt_and_missing_files_are_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let corrupt = dir.path().join("broken.png");
        std::fs::write(&corrupt, b"definitely not a png").unwrap();

        let err = decode(&corrupt).unwrap_err();
        assert_eq!(err.kind(), "decode_error");
        let err = decode(&dir.path().join("missing.jpg")).unwrap_err();
        assert_eq!(err.kind(), "decode_error");
    }

    #[test]
    fn save_creates_directories_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("deep/nested/out.png");
        let source = gradient(16, 12);

        save(&source, &target, ImageFormat::Png, q(85)).unwrap();
        let decoded = decode(&target).unwrap();
        assert_eq!(decoded.to_rgb8(), source.to_rgb8());
    }
}
