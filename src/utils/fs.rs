use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::{SlicerError, SlicerResult};

/// Create `path` and all of its parents.
pub fn create_dir_all(path: impl AsRef<Path>) -> SlicerResult<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).map_err(|e| {
        SlicerError::io(format!("Cannot create directory {}: {}", path.display(), e))
    })
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: impl AsRef<Path>) -> SlicerResult<()> {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write `bytes` to `path`, creating parent directories first.
pub fn write_file(path: impl AsRef<Path>, bytes: &[u8]) -> SlicerResult<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    fs::write(path, bytes)
        .map_err(|e| SlicerError::io(format!("Cannot write {}: {}", path.display(), e)))
}

/// Sibling directory named `<source><suffix>`, e.g. `photos-optimized`.
pub fn sibling_dir(source: &Path, suffix: &str) -> PathBuf {
    let trimmed = source
        .to_str()
        .map(|s| s.trim_end_matches(['/', '\\']))
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| source.to_path_buf());
    let mut name = trimmed.into_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// File name of `path` for logs and summaries; falls back to the full path.
pub fn extract_filename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// File stem of `path`, or `"output"` when it has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}
