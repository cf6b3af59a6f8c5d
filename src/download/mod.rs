//! Download module containing the single-file engine.
//!
//! # Overview
//!
//! - [`task`] - [`DownloadTask`], one resumable and validated transfer
//! - [`validation`] - [`ValidationSpec`], what a correct destination looks like
//! - [`hash`] - Streaming digests for SHA-512, SHA-256, SHA-1 and MD5
//! - [`companion`] - Discovery of `<url>.sha1` style companion files
//! - [`locator`] - Local sources that replace a network fetch
//! - [`summary`] - [`Outcome`], [`Summary`] and [`TaskState`]
//!
//! # Examples
//!
//! ```rust,no_run
//! use packfetch::download::{DownloadTask, ValidationSpec};
//! use packfetch::progress::ProgressEvent;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> packfetch::Result<()> {
//! let mut task = DownloadTask::builder_in_dir(
//!     "https://maven.fabricmc.net/net/fabricmc/fabric-loader/0.15.11/fabric-loader-0.15.11.jar",
//!     "libraries/net/fabricmc/fabric-loader/0.15.11",
//! )?
//! .companion_hashes(true)
//! .validation(ValidationSpec::builder().use_etag(true).build())
//! .build()?;
//!
//! let listener = |event: ProgressEvent| {
//!     if event.done {
//!         println!("{} bytes", event.bytes);
//!     }
//! };
//! task.execute(&CancellationToken::new(), &listener).await?;
//! # Ok(())
//! # }
//! ```

pub mod companion;
pub mod hash;
pub mod locator;
pub mod summary;
pub mod task;
pub mod validation;

pub use hash::{detect_hash_type, Digest, HashAlgorithm, HashingTransform};
pub use locator::{ArchiveLocator, DirectoryLocator, LocalSource, LocalSourceLocator};
pub use summary::{Outcome, Summary, TaskState};
pub use task::{DownloadTask, DownloadTaskBuilder};
pub use validation::{ValidationSpec, ValidationSpecBuilder};
