//! Downloader module: batches of tasks sharing one transport, one bandwidth
//! budget and one cancellation token.
//!
//! # Overview
//!
//! - `downloader` - [`Downloader`], runs tasks concurrently
//! - `builder` - [`DownloaderBuilder`]
//! - `config` - [`DownloadSettings`], [`DownloaderConfig`] and callback types
//! - `mirror` - [`MirrorRule`], prefix rules deriving mirror URLs
//!
//! # Examples
//!
//! ```rust,no_run
//! use packfetch::downloader::{DownloadSettings, DownloaderBuilder};
//!
//! # async fn example(settings_json: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let settings: DownloadSettings = serde_json::from_str(settings_json)?;
//! let downloader = DownloaderBuilder::new().settings(settings).build()?;
//!
//! let task = downloader
//!     .task_in_dir("https://example.com/packs/pack.zip", "cache")?
//!     .build()?;
//! let summaries = downloader.download(vec![task]).await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod downloader;
pub mod mirror;

pub use builder::DownloaderBuilder;
pub use config::{default_threads, DownloadCallback, DownloadSettings, DownloaderConfig, TransportKind};
pub use downloader::Downloader;
pub use mirror::{mirrors_for, MirrorRule};
