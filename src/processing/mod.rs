//! Image processing: the slicing pipeline and the transcode service.
//!
//! - [`codec`]: decode and quality-driven encode
//! - [`mapper`]: source tree → directory groups
//! - [`resize`], [`strip`], [`slicer`]: the per-group stages
//! - [`pipeline`]: drives the stages group by group
//! - [`transcode`]: whole-file compress / convert

pub mod codec;
pub mod mapper;
pub mod pipeline;
pub mod resize;
pub mod slicer;
pub mod strip;
pub mod transcode;

pub use mapper::{DirectoryGroup, map_directory, total_images};
pub use pipeline::{Pipeline, run_pipeline};
pub use resize::{ResizeSlot, ResizedImage, resize_group, resize_image, resized_height};
pub use slicer::{Tile, slice, tile_count};
pub use strip::assemble;
pub use transcode::{TranscodeService, run_transcode, transcode, transcode_file};
