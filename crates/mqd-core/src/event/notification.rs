//! Outward notifications from the supervisor to its owner (UI or CLI).

use crate::media::MediaInfo;
use crate::task::TaskIndex;

/// How a download ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    Completed { message: String },
    Failed { message: String },
    /// Terminated on request. Not ok, but not an error either.
    Stopped,
}

impl FinishOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FinishOutcome::Completed { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FinishOutcome::Failed { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            FinishOutcome::Completed { message } | FinishOutcome::Failed { message } => message,
            FinishOutcome::Stopped => "Stopped by user",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    InfoReceived { index: TaskIndex, info: Box<MediaInfo> },
    InfoFailed { index: TaskIndex, message: String },
    StatusChanged { index: TaskIndex, text: String },
    ProgressChanged { index: TaskIndex, percent: f64 },
    Finished { index: TaskIndex, outcome: FinishOutcome },
}

impl Notification {
    pub fn index(&self) -> TaskIndex {
        match self {
            Notification::InfoReceived { index, .. }
            | Notification::InfoFailed { index, .. }
            | Notification::StatusChanged { index, .. }
            | Notification::ProgressChanged { index, .. }
            | Notification::Finished { index, .. } => *index,
        }
    }
}
