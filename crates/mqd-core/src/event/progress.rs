//! Progress payload streamed by a download worker.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    /// One output file is complete (there can be several per task).
    Finished,
    Error,
    #[serde(other)]
    Other,
}

/// One progress callback from the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub status: ProgressStatus,
    #[serde(default)]
    pub downloaded_bytes: Option<u64>,
    #[serde(default)]
    pub total_bytes: Option<u64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
    /// Bytes per second.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Seconds remaining.
    #[serde(default)]
    pub eta: Option<f64>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl ProgressReport {
    pub fn downloading(downloaded: u64, total: Option<u64>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            downloaded_bytes: Some(downloaded),
            total_bytes: total,
            total_bytes_estimate: None,
            speed: None,
            eta: None,
            filename: None,
        }
    }

    pub fn finished(filename: Option<String>) -> Self {
        Self {
            status: ProgressStatus::Finished,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
            speed: None,
            eta: None,
            filename,
        }
    }

    /// Percent complete in [0, 100]. Uses the exact total when known, else the
    /// estimate; 0 when neither is available.
    pub fn percent(&self) -> f64 {
        let total = self
            .total_bytes
            .filter(|t| *t > 0)
            .map(|t| t as f64)
            .or(self.total_bytes_estimate.filter(|t| *t > 0.0))
            .unwrap_or(0.0);
        if total <= 0.0 {
            return 0.0;
        }
        let downloaded = self.downloaded_bytes.unwrap_or(0) as f64;
        (downloaded / total * 100.0).clamp(0.0, 100.0)
    }
}
