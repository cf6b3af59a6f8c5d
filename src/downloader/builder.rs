//! Builder pattern implementation for creating Downloader instances.
//!
//! # Examples
//!
//! ```rust
//! use packfetch::downloader::{DownloaderBuilder, MirrorRule};
//!
//! # fn main() -> packfetch::Result<()> {
//! let downloader = DownloaderBuilder::hidden()
//!     .threads(8)
//!     .max_speed(4 * 1024 * 1024)
//!     .mirror_rules(MirrorRule::bmclapi())
//!     .on_complete(|summary| println!("{}", summary))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use super::config::{DownloadSettings, DownloaderConfig, TransportKind};
use super::downloader::Downloader;
use super::mirror::MirrorRule;
use crate::cache::SidecarFormat;
use crate::download::Summary;
use crate::error::Result;
use crate::http::{NativeTransport, PooledTransport, Transport};
use crate::{ProgressBarOpts, StyleOptions};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::sync::Arc;
use std::time::Duration;

/// A builder used to create a [`Downloader`].
#[derive(Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Convenience function to hide the progress bars.
    pub fn hidden() -> Self {
        DownloaderBuilder::default().style_options(StyleOptions::new(
            ProgressBarOpts::hidden(),
            ProgressBarOpts::hidden(),
        ))
    }

    /// Replace every persistable setting at once.
    pub fn settings(mut self, settings: DownloadSettings) -> Self {
        self.config.settings = settings;
        self
    }

    /// Set the number of concurrent tasks. Values below 1 are raised to 1.
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.settings.threads = threads.max(1);
        self
    }

    /// Global speed cap in bytes per second shared by all tasks, 0 for none.
    pub fn max_speed(mut self, bytes_per_sec: u64) -> Self {
        self.config.settings.max_speed = bytes_per_sec;
        self
    }

    pub fn resume(mut self, resume: bool) -> Self {
        self.config.settings.resume = resume;
        self
    }

    pub fn companion_hashes(mut self, enabled: bool) -> Self {
        self.config.settings.companion_hashes = enabled;
        self
    }

    pub fn mirror_rule(mut self, rule: MirrorRule) -> Self {
        self.config.settings.mirror_rules.push(rule);
        self
    }

    pub fn mirror_rules(mut self, rules: impl IntoIterator<Item = MirrorRule>) -> Self {
        self.config.settings.mirror_rules.extend(rules);
        self
    }

    pub fn sidecar_format(mut self, format: SidecarFormat) -> Self {
        self.config.settings.sidecar_format = format;
        self
    }

    /// Pick the built-in transport. Ignored when [`transport`](Self::transport) is set.
    pub fn transport_kind(mut self, kind: TransportKind) -> Self {
        self.config.settings.transport = kind;
        self
    }

    /// Use a custom transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the number of retries of the pooled transport.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.http.retries = retries;
        self
    }

    pub fn proxy(mut self, proxy: reqwest::Proxy) -> Self {
        self.config.http.proxy = Some(proxy);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.http.read_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.http.user_agent = user_agent.into();
        self
    }

    /// Add the http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be
    /// merged into a single one.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.config
            .http
            .headers
            .get_or_insert_with(HeaderMap::new)
            .extend(headers);
        self
    }

    /// Add the http header
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.config
            .http
            .headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Set the downloader style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Set callback for when each task completes.
    ///
    /// The callback is called as soon as a task finishes, regardless of
    /// whether other tasks are still running.
    ///
    /// ```rust
    /// use packfetch::downloader::DownloaderBuilder;
    ///
    /// let builder = DownloaderBuilder::new().on_complete(|summary| {
    ///     match summary.error() {
    ///         None => println!("[Done] {}", summary),
    ///         Some(error) => println!("[Failed] {} - {}", summary.dest().display(), error),
    ///     }
    /// });
    /// ```
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Summary) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Create the [`Downloader`] with the specified options.
    pub fn build(self) -> Result<Downloader> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => match self.config.settings.transport {
                TransportKind::Native => Arc::new(NativeTransport::new(&self.config.http)?),
                TransportKind::Pooled => Arc::new(PooledTransport::new(self.config.http.clone())?),
            },
        };
        Ok(Downloader::new(self.config, transport))
    }
}
