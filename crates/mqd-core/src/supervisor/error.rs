use crate::task::TaskIndex;

/// Errors from supervisor operations. Worker failures are not errors here;
/// they arrive as notifications.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("task index {index} out of range (queue has {len} task(s))")]
    IndexOutOfRange { index: TaskIndex, len: usize },
    #[error("task {index} has an active download")]
    Busy { index: TaskIndex },
    /// Removed tasks must be enqueued again before they can download.
    #[error("task {index} was removed")]
    Removed { index: TaskIndex },
}
