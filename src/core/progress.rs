use serde::{Deserialize, Serialize};

/// Progress message type
#[derive(Debug, Deserialize, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProgressType {
    Start,
    Progress,
    Complete,
    Cancelled,
}

/// Progress event handed to the caller's callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Progress type (start, progress, complete, cancelled)
    pub progress_type: ProgressType,
    /// Images belonging to finished groups
    pub processed_images: usize,
    /// Images found by the directory walk
    pub total_images: usize,
    /// Progress percentage (0-100)
    pub progress_percentage: f64,
    /// Current status message
    pub status: String,
    /// Relative directory of the group that just finished
    #[serde(default)]
    pub group: Option<String>,
}

impl Progress {
    /// Create a new Progress instance with basic information
    pub fn new(
        progress_type: ProgressType,
        processed_images: usize,
        total_images: usize,
        status: &str,
    ) -> Self {
        Self {
            progress_type,
            processed_images,
            total_images,
            progress_percentage: percentage(processed_images, total_images),
            status: status.to_string(),
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Forces the percentage; used for the final 100% event.
    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.progress_percentage = percentage.clamp(0.0, 100.0);
        self
    }
}

/// `processed / total × 100`, clamped to [0, 100]. An empty run counts as done.
pub fn percentage(processed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (processed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}
