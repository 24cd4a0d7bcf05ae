use std::path::PathBuf;
use std::time::Duration;

use crate::config::MqdConfig;
use crate::proxy::ProxyConfig;

/// Runtime settings of a [`Supervisor`](super::Supervisor). The owner may
/// change `out_dir` and `proxy` between downloads; each download picks up the
/// values current at its start.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub out_dir: PathBuf,
    pub proxy: ProxyConfig,
    pub poll_interval: Duration,
    /// Bounded wait for a stopped download worker to exit.
    pub stop_timeout: Duration,
    /// Bounded wait for a finished worker during cleanup.
    pub cleanup_timeout: Duration,
}

impl SupervisorOptions {
    pub fn from_config(cfg: &MqdConfig) -> Self {
        Self {
            out_dir: cfg.out_dir.clone(),
            proxy: cfg.proxy.clone(),
            poll_interval: cfg.poll_interval(),
            stop_timeout: cfg.stop_timeout(),
            cleanup_timeout: cfg.cleanup_timeout(),
        }
    }
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self::from_config(&MqdConfig::default())
    }
}
