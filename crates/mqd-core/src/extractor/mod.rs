//! The external extraction capability.
//!
//! Metadata fetch and download are delegated to an external program. An
//! [`Extractor`] describes how to run that program as a worker process and how
//! to read its output; the worker module does the actual process handling.

mod error;
mod ytdlp;

pub use error::ExtractorError;
pub use ytdlp::{YtDlp, PROGRESS_MARKER};

use std::path::PathBuf;
use std::process::ExitStatus;
use tokio::process::Command;

use crate::event::ProgressReport;
use crate::media::MediaInfo;

/// Everything a download worker needs besides the URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub out_dir: PathBuf,
    /// Destination file name; `None` lets the extractor name the file.
    pub filename: Option<String>,
    pub proxy: Option<String>,
}

impl DownloadRequest {
    /// Final path of the artifact, when the file name is known up front.
    pub fn output_path(&self) -> Option<PathBuf> {
        self.filename.as_ref().map(|f| self.out_dir.join(f))
    }
}

pub trait Extractor: Send + Sync + 'static {
    /// Program name used in error messages and logs.
    fn program(&self) -> &str;

    /// Command that prints metadata for `url` on stdout.
    fn info_command(&self, url: &str) -> Command;

    /// Command that downloads `url`, printing progress lines on stdout.
    fn download_command(&self, url: &str, request: &DownloadRequest) -> Command;

    /// Parse the complete stdout of the info command.
    fn parse_info(&self, stdout: &str) -> Result<MediaInfo, ExtractorError> {
        Ok(serde_json::from_str(stdout.trim())?)
    }

    /// Parse one stdout line of the download command; `None` for unrelated output.
    fn parse_progress(&self, line: &str) -> Option<ProgressReport>;

    /// Extension of the files this extractor produces, if it is fixed.
    fn output_extension(&self) -> Option<&str> {
        None
    }

    /// Human-readable reason for an unsuccessful exit.
    fn failure_message(&self, stderr: &str, status: ExitStatus) -> String {
        let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if let Some(err) = lines.iter().rev().find_map(|l| l.strip_prefix("ERROR:")) {
            return err.trim().to_string();
        }
        match lines.last() {
            Some(last) => last.to_string(),
            None => format!("{} exited with {}", self.program(), status),
        }
    }
}
