//! yt-dlp as the extraction backend.

use tokio::process::Command;

use super::{DownloadRequest, Extractor};
use crate::config::ExtractorConfig;
use crate::event::ProgressReport;

/// Prefix of the progress lines requested through `--progress-template`.
pub const PROGRESS_MARKER: &str = "[mqd-progress]";

/// Output template used when no destination name is known yet.
const DEFAULT_OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    format: String,
    merge_output_format: Option<String>,
}

impl YtDlp {
    pub fn new(cfg: &ExtractorConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            format: cfg.format.clone(),
            merge_output_format: cfg.merge_output_format.clone(),
        }
    }

    pub(crate) fn info_args(&self, url: &str) -> Vec<String> {
        vec![
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
            "--skip-download".to_string(),
            "--".to_string(),
            url.to_string(),
        ]
    }

    pub(crate) fn download_args(&self, url: &str, request: &DownloadRequest) -> Vec<String> {
        let template = match &request.filename {
            // yt-dlp treats '%' in -o as a template field.
            Some(name) => request.out_dir.join(name.replace('%', "%%")),
            None => request.out_dir.join(DEFAULT_OUTPUT_TEMPLATE),
        };

        let mut args = vec![
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "--progress-template".to_string(),
            format!("download:{PROGRESS_MARKER} %(progress)j"),
            "-f".to_string(),
            self.format.clone(),
        ];
        if let Some(ext) = &self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(ext.clone());
        }
        if let Some(proxy) = &request.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        args.push("-o".to_string());
        args.push(template.to_string_lossy().into_owned());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl Extractor for YtDlp {
    fn program(&self) -> &str {
        &self.program
    }

    fn info_command(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.info_args(url));
        cmd
    }

    fn download_command(&self, url: &str, request: &DownloadRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.download_args(url, request));
        cmd
    }

    fn parse_progress(&self, line: &str) -> Option<ProgressReport> {
        parse_progress_line(line)
    }

    fn output_extension(&self) -> Option<&str> {
        self.merge_output_format.as_deref()
    }
}

/// Parses a `[mqd-progress] {json}` line. Other yt-dlp output yields `None`.
pub(crate) fn parse_progress_line(line: &str) -> Option<ProgressReport> {
    let json = line.trim().strip_prefix(PROGRESS_MARKER)?;
    match serde_json::from_str(json.trim()) {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::debug!("unparseable progress line: {}", e);
            None
        }
    }
}
