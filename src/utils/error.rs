//! Error types for the image slicer.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.
//! Cancellation is deliberately absent: a cancelled run is a terminal state
//! reported through [`crate::core::RunStatus`], not an error.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Validation errors for run configuration, raised before any work starts.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Path-related validation error
    #[error("Path error: {0}")]
    Path(#[from] PathError),
    /// Invalid settings error
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Source or destination path errors.
#[derive(Error, Debug)]
pub enum PathError {
    /// Path does not exist
    #[error("Not found: {0}")]
    NotFound(PathBuf),
    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    /// IO error accessing the path
    #[error("IO error: {0}")]
    IO(String),
}

/// Main error type for the slicer.
///
/// Decode and encode errors are always recovered at the file or group
/// boundary; only validation errors ever abort a run.
#[derive(Error, Debug)]
pub enum SlicerError {
    /// Configuration was rejected before the run started
    #[error("Configuration error: {0}")]
    Validation(#[from] ValidationError),

    /// Source file is unreadable, corrupt or in an unsupported format
    #[error("Decode error for {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Codec rejected the parameters or produced no output
    #[error("Encode error: {0}")]
    Encode(String),

    /// Directory creation, permission or write failure
    #[error("IO error: {0}")]
    IO(String),

    /// Worker pool failure (construction or a panicking job)
    #[error("Worker error: {0}")]
    Worker(String),
}

/// Convenience result type for slicer operations.
pub type SlicerResult<T> = Result<T, SlicerError>;

// Helper methods for error creation
impl SlicerError {
    pub fn decode<T: Into<String>>(path: &Path, reason: T) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn encode<T: Into<String>>(msg: T) -> Self {
        Self::Encode(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::IO(msg.into())
    }

    pub fn worker<T: Into<String>>(msg: T) -> Self {
        Self::Worker(msg.into())
    }

    /// Short machine-friendly tag for the summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "configuration_error",
            Self::Decode { .. } => "decode_error",
            Self::Encode(_) => "encode_error",
            Self::IO(_) => "io_error",
            Self::Worker(_) => "worker_error",
        }
    }
}

// Helper methods for validation error creation
impl ValidationError {
    pub fn path_not_found(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotFound(path.into()))
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::Path(PathError::NotADirectory(path.into()))
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}

// Convert std::io::Error to SlicerError
impl From<io::Error> for SlicerError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

// Convert io::Error to PathError
impl From<io::Error> for PathError {
    fn from(err: io::Error) -> Self {
        Self::IO(err.to_string())
    }
}

// Convert PathError to SlicerError
impl From<PathError> for SlicerError {
    fn from(err: PathError) -> Self {
        Self::Validation(ValidationError::Path(err))
    }
}
