use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::proxy::ProxyConfig;

/// How the external extractor is invoked (optional `[extractor]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Executable name or absolute path of the extractor.
    pub program: String,
    /// Format selector passed through as `-f`.
    pub format: String,
    /// Container the extractor merges separate video/audio streams into.
    /// Also decides the destination file extension when set.
    pub merge_output_format: Option<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            format: "bestvideo+bestaudio/best".to_string(),
            merge_output_format: Some("webm".to_string()),
        }
    }
}

/// Where and how much to log (optional `[logging]` section in config.toml).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directives, e.g. `"warn,mqd_core=info"`. `RUST_LOG` wins when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Log file; defaults to `mqd.log` in the XDG state dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Global configuration loaded from `~/.config/mqd/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqdConfig {
    /// Directory downloads are written to. Relative paths resolve against the
    /// working directory of `mqd`.
    pub out_dir: PathBuf,
    /// Interval of the event pump in milliseconds.
    pub poll_interval_ms: u64,
    /// How long a stopped download worker is given to exit after termination.
    pub stop_timeout_ms: u64,
    /// How long a finished worker is given to exit during cleanup.
    pub cleanup_timeout_ms: u64,
    /// Maximum number of history entries kept.
    pub history_limit: u32,
    pub extractor: ExtractorConfig,
    pub proxy: ProxyConfig,
    pub logging: LoggingConfig,
}

impl Default for MqdConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("downloads"),
            poll_interval_ms: 80,
            stop_timeout_ms: 1000,
            cleanup_timeout_ms: 500,
            history_limit: 50,
            extractor: ExtractorConfig::default(),
            proxy: ProxyConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MqdConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_millis(self.cleanup_timeout_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mqd")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MqdConfig> {
    load_or_init_at(&config_path()?)
}

/// Same as [`load_or_init`] but for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<MqdConfig> {
    if !path.exists() {
        let default_cfg = MqdConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("write default config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: MqdConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
