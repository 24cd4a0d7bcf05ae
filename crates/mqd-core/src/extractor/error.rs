//! Errors from running the external extractor.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    /// The extractor binary could not be started (missing, not executable, ...).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The extractor ran and exited unsuccessfully.
    #[error("{message}")]
    Failed { code: Option<i32>, message: String },
    #[error("invalid metadata from extractor: {0}")]
    InvalidMetadata(#[from] serde_json::Error),
    #[error("worker i/o: {0}")]
    Io(#[from] io::Error),
}
