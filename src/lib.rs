//! packfetch is the download engine of a modpack launcher backend.
//!
//! Every file a launcher installs (game jars, asset objects, libraries,
//! mod-loader installers, mods) goes through one [`DownloadTask`]: a
//! resumable, verified transfer with conditional caching, mirror failover,
//! local-source short-circuiting and a bandwidth budget shared across
//! concurrent transfers.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use packfetch::{downloader::DownloaderBuilder, download::ValidationSpec, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let downloader = DownloaderBuilder::new().threads(8).build()?;
//! let task = downloader
//!     .task(
//!         "https://piston-data.mojang.com/v1/objects/abc/client.jar",
//!         "versions/1.21/1.21.jar",
//!     )
//!     .validation(ValidationSpec::builder().sha1("ce27cb141098feb00714e758646be3e99c185b71")?.build())
//!     .build()?;
//! downloader.download(vec![task]).await;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`download`] - The single-file engine: `DownloadTask`, `ValidationSpec`, hashing, locators
//! - [`downloader`] - The batch `Downloader` and its builder, settings and mirror rules
//! - [`http`] - The `Transport` trait with its native and pooled implementations
//! - [`cache`] - The `<dest>.etag` sidecar used for conditional requests
//! - [`throttle`] - The shared byte-rate limiter
//! - [`progress`] - Progress events, aggregation and progress bars
//! - [`archive`] - Reading entries of local ZIP archives
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`utils`] - Shared utility functions

pub mod archive;
pub mod cache;
pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod progress;
pub mod throttle;
pub mod utils;

pub use cache::{CacheSidecar, SidecarFormat};
pub use download::{
    DownloadTask, DownloadTaskBuilder, HashAlgorithm, Outcome, Summary, TaskState, ValidationSpec,
};
pub use downloader::{DownloadSettings, Downloader, DownloaderBuilder, MirrorRule};
pub use error::{Error, Result};
pub use http::{HttpClientConfig, NativeTransport, PooledTransport, Transport};
pub use progress::{ProgressBarOpts, ProgressEvent, ProgressListener, StyleOptions};
pub use throttle::Throttle;
pub use tokio_util::sync::CancellationToken;
