//! Media metadata as reported by the extractor, and destination naming.

mod sanitize;

pub use sanitize::sanitize_title;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use sanitize::NAME_MAX;

/// Title used when metadata has none.
pub const UNTITLED: &str = "Untitled";

/// Extension used when neither config nor metadata provide one.
const DEFAULT_EXT: &str = "mp4";

/// Metadata for one media item.
///
/// Only the fields the supervisor reads are typed; everything else the
/// extractor reported is kept in `extra` so it can be passed on untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpage_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MediaInfo {
    pub fn title_or_default(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNTITLED)
    }

    /// Destination file name: sanitized title plus extension.
    ///
    /// `merge_ext` (the container streams get merged into) wins over the
    /// extension reported in the metadata.
    pub fn destination_filename(&self, merge_ext: Option<&str>) -> String {
        let ext = merge_ext
            .or(self.ext.as_deref())
            .map(|e| e.trim_start_matches('.'))
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_EXT);
        let max_stem = NAME_MAX.saturating_sub(ext.len() + 1);
        let mut stem = sanitize_title(self.title_or_default(), max_stem);
        if stem.is_empty() {
            stem = UNTITLED.to_lowercase();
        }
        format!("{stem}.{ext}")
    }
}

/// Accepts only absolute http(s) URLs.
pub fn ensure_http_url(input: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(input.trim()).with_context(|| format!("invalid URL: {input}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => bail!("unsupported URL scheme {other:?}: {input}"),
    }
    if parsed.host_str().is_none() {
        bail!("URL has no host: {input}");
    }
    Ok(parsed)
}
