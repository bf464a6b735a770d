//! Groups the images of a source tree by directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::utils::is_supported_image;

/// The supported images found directly inside one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    /// Directory relative to the source root; empty for the root itself
    pub relative_path: PathBuf,
    /// Absolute file paths in enumeration order; this is the stacking order
    pub files: Vec<PathBuf>,
}

impl DirectoryGroup {
    /// Display name for logs and progress events.
    pub fn name(&self) -> String {
        if self.relative_path.as_os_str().is_empty() {
            ".".to_string()
        } else {
            self.relative_path.display().to_string()
        }
    }

    /// Output directory of this group under `dest_root`.
    pub fn output_dir(&self, dest_root: &Path) -> PathBuf {
        dest_root.join(&self.relative_path)
    }
}

/// Walks `source_root` once and returns one group per directory that holds
/// at least one supported image.
///
/// Directories come in pre-order and entries are sorted by file name, so an
/// unmodified tree always maps to the same groups in the same order.
/// Unreadable entries are logged and skipped. An empty result is not an error.
pub fn map_directory(source_root: &Path) -> Vec<DirectoryGroup> {
    let root = std::path::absolute(source_root).unwrap_or_else(|_| source_root.to_path_buf());
    info!("Mapping images under {}", root.display());

    let mut groups: Vec<DirectoryGroup> = Vec::new();
    let mut group_index: HashMap<PathBuf, usize> = HashMap::new();

    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();

        if entry.file_type().is_dir() {
            let relative = relative_to(&root, path);
            group_index.insert(relative.clone(), groups.len());
            groups.push(DirectoryGroup {
                relative_path: relative,
                files: Vec::new(),
            });
            continue;
        }

        if !path.is_file() || !is_supported_image(path) {
            continue;
        }

        let Some(parent) = path.parent() else {
            continue;
        };
        if let Some(&index) = group_index.get(&relative_to(&root, parent)) {
            groups[index].files.push(path.to_path_buf());
        }
    }

    groups.retain(|group| !group.files.is_empty());
    info!(
        "Found {} images in {} directories",
        total_images(&groups),
        groups.len()
    );
    groups
}

/// Number of files across `groups`.
pub fn total_images(groups: &[DirectoryGroup]) -> usize {
    groups.iter().map(|group| group.files.len()).sum()
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
