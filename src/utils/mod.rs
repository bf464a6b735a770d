pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{PathError, SlicerError, SlicerResult, ValidationError};
pub use validation::{
    validate_compress_settings,
    validate_convert_settings,
    validate_slice_settings,
};
pub use formats::{
    ImageFormat,
    OutputFormat,
    SUPPORTED_EXTENSIONS,
    is_supported_image,
    png_compression_level,
};
pub use fs::{
    create_dir_all,
    ensure_parent_dir,
    extract_filename,
    write_file,
};
