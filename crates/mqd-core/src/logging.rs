//! Logging init from the `[logging]` config section.
//!
//! Filter precedence: `RUST_LOG`, then `logging.filter`, then [`DEFAULT_FILTER`].
//! Output goes to `logging.file` or `mqd.log` in the XDG state dir; callers fall
//! back to [`init_logging_stderr`] when that file cannot be opened.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::paths;

pub const DEFAULT_FILTER: &str = "info,mqd_core=debug,mqd=debug";

/// First non-blank of the environment value, the configured filter, the default.
fn filter_directives(env: Option<String>, configured: Option<&str>) -> String {
    let non_blank = |s: &str| !s.trim().is_empty();
    env.filter(|s| non_blank(s))
        .or_else(|| configured.filter(|s| non_blank(s)).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn env_filter(cfg: &LoggingConfig) -> EnvFilter {
    let directives = filter_directives(
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        cfg.filter.as_deref(),
    );
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("mqd: invalid log filter {directives:?} ({e}), using {DEFAULT_FILTER:?}");
        EnvFilter::new(DEFAULT_FILTER)
    })
}

/// Configured log file, else `~/.local/state/mqd/mqd.log`.
pub fn log_file_path(cfg: &LoggingConfig) -> Result<PathBuf> {
    match &cfg.file {
        Some(file) => Ok(file.clone()),
        None => paths::log_file(),
    }
}

/// Initialize structured logging to the configured log file.
/// Returns Err if the file cannot be opened so the caller can fall back to stderr.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let path = log_file_path(cfg)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(cfg))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("mqd logging initialized at {}", path.display());
    Ok(())
}

/// Initialize logging to stderr only, with the same filter rules.
pub fn init_logging_stderr(cfg: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(cfg))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_filter_wins_over_config() {
        let d = filter_directives(Some("trace".to_string()), Some("warn"));
        assert_eq!(d, "trace");
    }

    #[test]
    fn config_filter_used_without_env() {
        assert_eq!(filter_directives(None, Some("warn,mqd_core=info")), "warn,mqd_core=info");
        assert_eq!(filter_directives(Some("  ".to_string()), Some("warn")), "warn");
    }

    #[test]
    fn default_filter_when_nothing_set() {
        assert_eq!(filter_directives(None, None), DEFAULT_FILTER);
        assert_eq!(filter_directives(None, Some("")), DEFAULT_FILTER);
    }

    #[test]
    fn configured_log_file_is_used() {
        let cfg = LoggingConfig {
            file: Some(PathBuf::from("/tmp/mqd-test.log")),
            ..LoggingConfig::default()
        };
        assert_eq!(log_file_path(&cfg).unwrap(), PathBuf::from("/tmp/mqd-test.log"));
    }
}
