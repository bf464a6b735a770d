//! Strip assembler: stacks a group's resized images into one tall RGB bitmap.

use image::{DynamicImage, RgbImage, imageops};
use tracing::debug;

/// Stacks `images` top to bottom in the given order.
///
/// The strip is `target_width` wide, or as wide as the widest input when
/// `target_width` is 0. Every image is pasted at x = 0; rows a narrower image
/// does not cover stay black. Returns `None` for an empty input.
pub fn assemble<'a, I>(images: I, target_width: u32) -> Option<RgbImage>
where
    I: IntoIterator<Item = &'a DynamicImage>,
    I::IntoIter: Clone,
{
    let images = images.into_iter();
    let mut count = 0usize;
    let mut height = 0u32;
    let mut widest = 0u32;
    for image in images.clone() {
        count += 1;
        height = height.saturating_add(image.height());
        widest = widest.max(image.width());
    }
    if count == 0 {
        return None;
    }

    let width = if target_width == 0 { widest } else { target_width };
    let mut strip = RgbImage::new(width, height);

    let mut offset = 0i64;
    for image in images {
        imageops::replace(&mut strip, &image.to_rgb8(), 0, offset);
        offset += i64::from(image.height());
    }

    debug!("Assembled {} images into a {}×{} strip", count, width, height);
    Some(strip)
}
