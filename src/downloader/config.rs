//! Configuration structures and defaults for the downloader.
//!
//! [`DownloadSettings`] is the part a launcher keeps in its JSON settings
//! file. [`DownloaderConfig`] adds what only makes sense at runtime:
//! progress styling, the completion callback, the HTTP client setup.
//!
//! # Examples
//!
//! ```rust
//! use packfetch::downloader::DownloadSettings;
//!
//! # fn main() -> Result<(), serde_json::Error> {
//! let settings: DownloadSettings = serde_json::from_str(r#"{ "threads": 8, "max_speed": 1048576 }"#)?;
//! assert_eq!(settings.threads, 8);
//! assert!(settings.resume);
//! # Ok(())
//! # }
//! ```

use super::mirror::MirrorRule;
use crate::cache::SidecarFormat;
use crate::download::Summary;
use crate::http::HttpClientConfig;
use crate::StyleOptions;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Callback type for download completion events
pub type DownloadCallback = Box<dyn Fn(&Summary) + Send + Sync>;

/// Worker count derived from the CPU count, never below 2.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(2)
}

/// Which [`Transport`](crate::http::Transport) the downloader builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Plain reqwest client.
    #[default]
    Native,
    /// Middleware client with transient-failure retries and request tracing.
    Pooled,
}

/// Persistable download settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Maximum number of concurrent tasks.
    pub threads: usize,
    /// Global speed cap in bytes per second, 0 for none.
    pub max_speed: u64,
    /// Resume interrupted transfers.
    pub resume: bool,
    /// Look for companion hash files when a task has no digest.
    pub companion_hashes: bool,
    /// Prefix rules deriving mirrors for tasks that have none.
    pub mirror_rules: Vec<MirrorRule>,
    pub sidecar_format: SidecarFormat,
    pub transport: TransportKind,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            max_speed: 0,
            resume: true,
            companion_hashes: false,
            mirror_rules: Vec::new(),
            sidecar_format: SidecarFormat::default(),
            transport: TransportKind::default(),
        }
    }
}

/// Configuration structure for the downloader
#[derive(Clone, Default)]
pub struct DownloaderConfig {
    pub settings: DownloadSettings,
    pub http: HttpClientConfig,
    pub style_options: StyleOptions,
    /// Callback for when each task completes.
    pub on_complete: Option<Arc<DownloadCallback>>,
}

impl std::fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("settings", &self.settings)
            .field("http", &self.http)
            .field("style_options", &self.style_options)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = DownloadSettings::default();
        assert!(settings.threads >= 2);
        assert_eq!(settings.max_speed, 0);
        assert!(settings.resume);
        assert_eq!(settings.transport, TransportKind::Native);
    }

    #[test]
    fn test_settings_roundtrip_json() {
        let settings = DownloadSettings {
            threads: 4,
            max_speed: 1024,
            mirror_rules: vec![MirrorRule::new("https://a/", "https://b/")],
            sidecar_format: SidecarFormat::Text,
            transport: TransportKind::Pooled,
            ..DownloadSettings::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"transport\":\"pooled\""));
        let back: DownloadSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: DownloadSettings = serde_json::from_str(r#"{"resume": false}"#).unwrap();
        assert!(!settings.resume);
        assert!(settings.threads >= 2);
    }
}
