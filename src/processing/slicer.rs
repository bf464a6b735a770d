//! Cuts a strip into fixed-height tiles.

use image::{RgbImage, imageops};

use crate::utils::OutputFormat;

/// One horizontal crop of a strip, detached from it.
#[derive(Debug, Clone)]
pub struct Tile {
    pub index: usize,
    pub image: RgbImage,
    /// `slice_<index>.<ext>`
    pub file_name: String,
}

/// File name of the tile at `index`.
pub fn tile_file_name(index: usize, format: &OutputFormat) -> String {
    format.file_name(&format!("slice_{index}"))
}

/// Number of tiles a strip of `strip_height` rows yields.
pub fn tile_count(strip_height: u32, slice_height: u32) -> usize {
    if slice_height == 0 {
        return 0;
    }
    strip_height.div_ceil(slice_height) as usize
}

/// Cuts `strip` into tiles of `slice_height` rows spanning the full width.
///
/// The last tile holds whatever rows remain and may be shorter. A
/// `slice_height` of 0 yields no tiles; callers handle the unsliced case
/// before getting here.
pub fn slice(strip: &RgbImage, slice_height: u32, format: &OutputFormat) -> Vec<Tile> {
    let (width, height) = strip.dimensions();
    if slice_height == 0 {
        return Vec::new();
    }

    (0..height)
        .step_by(slice_height as usize)
        .map(|top| {
            let index = (top / slice_height) as usize;
            let rows = slice_height.min(height - top);
            Tile {
                index,
                image: imageops::crop_imm(strip, 0, top, width, rows).to_image(),
                file_name: tile_file_name(index, format),
            }
        })
        .collect()
}
