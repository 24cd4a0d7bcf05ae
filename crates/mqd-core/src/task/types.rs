//! Types describing one queued URL and its lifecycle.

use std::path::PathBuf;

use crate::media::MediaInfo;

/// Position of a task in the [`TaskList`](super::TaskList).
pub type TaskIndex = usize;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Queued,
    Downloading,
    Stopped,
    Removed,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Downloading => "downloading",
            TaskStatus::Stopped => "stopped",
            TaskStatus::Removed => "removed",
            TaskStatus::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One queued URL.
#[derive(Debug, Clone)]
pub struct Task {
    pub url: String,
    pub status: TaskStatus,
    /// Title from fetched metadata.
    pub title: Option<String>,
    /// Full metadata from the last successful info fetch.
    pub info: Option<MediaInfo>,
    /// Destination file name derived from metadata.
    pub filename: Option<String>,
    /// Where the download is (or will be) written.
    pub output_path: Option<PathBuf>,
    /// Last percent reported to the owner, 0.0..=100.0.
    pub progress: f64,
}

impl Task {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: TaskStatus::Queued,
            title: None,
            info: None,
            filename: None,
            output_path: None,
            progress: 0.0,
        }
    }

    /// Title for display: metadata title, falling back to the URL.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}
