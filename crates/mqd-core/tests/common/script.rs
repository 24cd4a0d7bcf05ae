//! Shell-script stand-in for the extractor.
//!
//! Info scripts get the URL as `$1`. Download scripts get the URL, the
//! destination path (or the output directory when no name is known yet) and
//! the proxy (empty for a direct connection) as `$1`, `$2` and `$3`.
//! Progress lines use the same `[mqd-progress] {json}` format as yt-dlp.

use mqd_core::event::ProgressReport;
use mqd_core::extractor::{DownloadRequest, Extractor, YtDlp};
use tokio::process::Command;

pub struct ScriptExtractor {
    pub program: String,
    pub info_script: String,
    pub download_script: String,
    pub ext: Option<String>,
}

impl ScriptExtractor {
    pub fn new(info_script: &str, download_script: &str) -> Self {
        Self {
            program: "sh".to_string(),
            info_script: info_script.to_string(),
            download_script: download_script.to_string(),
            ext: Some("webm".to_string()),
        }
    }

    fn script(&self, body: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-c").arg(body).arg("mqd-test");
        cmd
    }
}

impl Extractor for ScriptExtractor {
    fn program(&self) -> &str {
        &self.program
    }

    fn info_command(&self, url: &str) -> Command {
        let mut cmd = self.script(&self.info_script);
        cmd.arg(url);
        cmd
    }

    fn download_command(&self, url: &str, request: &DownloadRequest) -> Command {
        let dest = request
            .output_path()
            .unwrap_or_else(|| request.out_dir.clone());
        let mut cmd = self.script(&self.download_script);
        cmd.arg(url)
            .arg(dest)
            .arg(request.proxy.as_deref().unwrap_or(""));
        cmd
    }

    fn parse_progress(&self, line: &str) -> Option<ProgressReport> {
        YtDlp::default().parse_progress(line)
    }

    fn output_extension(&self) -> Option<&str> {
        self.ext.as_deref()
    }
}

/// `echo` line for a downloading progress report.
pub fn progress_line(downloaded: u64, total: u64) -> String {
    format!(
        r#"echo '[mqd-progress] {{"status":"downloading","downloaded_bytes":{downloaded},"total_bytes":{total}}}'"#
    )
}

/// Info script printing metadata with the given title.
pub fn info_json(title: &str) -> String {
    format!(r#"echo '{{"id":"abc","title":"{title}","ext":"mp4"}}'"#)
}
