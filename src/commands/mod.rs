//! Command handlers behind the CLI.
//!
//! - [`slice_images`]: resize, stack and slice a directory tree
//! - [`compress_images`]: re-encode in place formats
//! - [`convert_images`]: re-encode to one format

mod image;

pub use image::*;
