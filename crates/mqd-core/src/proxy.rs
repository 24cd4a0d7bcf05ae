//! Proxy selection for downloads.
//!
//! A proxy address is built from the configured mode and then filtered per URL
//! by an optional whitelist or blacklist of case-insensitive substrings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    #[default]
    None,
    /// `socks4://127.0.0.1:<port>`
    Socks4,
    /// `socks5://127.0.0.1:<port>`
    Socks5,
    /// Use `custom` verbatim.
    Custom,
}

/// Which URLs the proxy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListMode {
    /// Every URL.
    #[default]
    None,
    /// Only URLs containing one of `whitelist`.
    Whitelist,
    /// Only URLs containing none of `blacklist`.
    Blacklist,
}

/// Proxy settings (`[proxy]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub mode: ProxyMode,
    /// Local port for the socks modes.
    pub port: u16,
    /// Full proxy URL for `mode = "custom"`.
    pub custom: String,
    pub list_mode: ListMode,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            mode: ProxyMode::None,
            port: 1080,
            custom: String::new(),
            list_mode: ListMode::None,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
        }
    }
}

impl ProxyConfig {
    /// A config that always routes through `address` (used for `--proxy`).
    pub fn custom(address: impl Into<String>) -> Self {
        Self {
            mode: ProxyMode::Custom,
            custom: address.into(),
            ..Self::default()
        }
    }

    /// The proxy address implied by the mode, ignoring list filtering.
    pub fn address(&self) -> Option<String> {
        match self.mode {
            ProxyMode::None => None,
            ProxyMode::Socks4 => Some(format!("socks4://127.0.0.1:{}", self.port)),
            ProxyMode::Socks5 => Some(format!("socks5://127.0.0.1:{}", self.port)),
            ProxyMode::Custom => {
                let custom = self.custom.trim();
                (!custom.is_empty()).then(|| custom.to_string())
            }
        }
    }

    /// Proxy address to use for `url`, or `None` for a direct connection.
    pub fn resolve(&self, url: &str) -> Option<String> {
        let address = self.address()?;
        let url = url.to_lowercase();
        let use_proxy = match self.list_mode {
            ListMode::None => true,
            ListMode::Whitelist => matches_any(&url, &self.whitelist),
            ListMode::Blacklist => !matches_any(&url, &self.blacklist),
        };
        use_proxy.then_some(address)
    }
}

/// Patterns may also be given comma- or newline-separated within one entry.
fn matches_any(url_lower: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .flat_map(|p| p.split([',', '\n']))
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .any(|p| url_lower.contains(&p))
}
