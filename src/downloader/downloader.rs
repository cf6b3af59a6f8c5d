//! Batch execution of download tasks.
//!
//! The [`Downloader`] owns what tasks of one batch share: the transport, the
//! bandwidth [`Throttle`], the cancellation token and the progress
//! aggregation. It runs up to `threads` tasks at once.
//!
//! # Examples
//!
//! ```rust,no_run
//! use packfetch::downloader::DownloaderBuilder;
//! use packfetch::download::ValidationSpec;
//!
//! # async fn example() -> packfetch::Result<()> {
//! let downloader = DownloaderBuilder::new().threads(4).build()?;
//! let tasks = vec![
//!     downloader
//!         .task("https://example.com/mods/a.jar", "mods/a.jar")
//!         .validation(ValidationSpec::builder().size(1024).build())
//!         .build()?,
//!     downloader.task_in_dir("https://example.com/mods/b.jar", "mods")?.build()?,
//! ];
//!
//! for summary in downloader.download(tasks).await {
//!     println!("{}", summary);
//! }
//! # Ok(())
//! # }
//! ```

use super::config::DownloaderConfig;
use super::mirror::mirrors_for;
use crate::download::{DownloadTask, DownloadTaskBuilder, Summary};
use crate::error::Result;
use crate::http::Transport;
use crate::progress::{
    ChildProgress, ProgressAggregator, ProgressDisplay, ProgressEvent, ProgressListener,
    TrackedProgress,
};
use crate::throttle::Throttle;

use futures::stream::{self, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Feeds one task's events to its bar and to the batch aggregate.
struct BatchListener {
    child: ChildProgress,
    tracked: TrackedProgress,
}

impl ProgressListener for BatchListener {
    fn on_progress(&self, event: ProgressEvent) {
        self.child.on_progress(event);
        self.tracked.on_progress(event);
    }
}

/// Represents the download controller.
#[derive(Clone)]
pub struct Downloader {
    config: DownloaderConfig,
    transport: Arc<dyn Transport>,
    throttle: Arc<Throttle>,
    cancel: CancellationToken,
    progress: ProgressAggregator,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    pub(crate) fn new(config: DownloaderConfig, transport: Arc<dyn Transport>) -> Self {
        let throttle = Arc::new(Throttle::new(config.settings.max_speed));
        Self {
            config,
            transport,
            throttle,
            cancel: CancellationToken::new(),
            progress: ProgressAggregator::new(),
        }
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.config.settings.threads
    }

    /// The bandwidth budget shared by every task of this downloader.
    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    /// Change the global speed cap, effective for running tasks too.
    pub fn set_max_speed(&self, bytes_per_sec: u64) {
        self.throttle.set_rate(bytes_per_sec);
    }

    /// Bytes, speed and ETA across all tasks run so far.
    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    /// Token cancelling every running and queued task of this downloader.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A task builder wired to this downloader's transport, throttle and settings.
    pub fn task(&self, url: impl Into<String>, dest: impl Into<PathBuf>) -> DownloadTaskBuilder {
        self.configure(DownloadTask::builder(url, dest))
    }

    /// Like [`task`](Self::task), naming the destination after the URL.
    pub fn task_in_dir(
        &self,
        url: impl Into<String>,
        dir: impl AsRef<Path>,
    ) -> Result<DownloadTaskBuilder> {
        Ok(self.configure(DownloadTask::builder_in_dir(url, dir)?))
    }

    fn configure(&self, builder: DownloadTaskBuilder) -> DownloadTaskBuilder {
        let settings = &self.config.settings;
        builder
            .transport(self.transport.clone())
            .throttle(self.throttle.clone())
            .resume(settings.resume)
            .companion_hashes(settings.companion_hashes)
            .sidecar_format(settings.sidecar_format)
    }

    /// Run `tasks`, at most `threads` at a time.
    ///
    /// Returns one [`Summary`] per task, in completion order.
    pub async fn download(&self, tasks: Vec<DownloadTask>) -> Vec<Summary> {
        let display = ProgressDisplay::new(self.config.style_options.clone(), tasks.len());

        let summaries = stream::iter(tasks)
            .map(|task| self.run(task, &display))
            .buffer_unordered(self.config.settings.threads.max(1))
            .collect::<Vec<_>>()
            .await;

        display.finish();
        summaries
    }

    async fn run(&self, mut task: DownloadTask, display: &ProgressDisplay) -> Summary {
        let rules = &self.config.settings.mirror_rules;
        if !rules.is_empty() {
            task.fill_mirrors(mirrors_for(rules, task.url()));
        }

        let name = task
            .dest()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| task.url().to_owned());
        let listener = BatchListener {
            child: display.create_child(&name),
            tracked: self.progress.track(),
        };

        let result = task.execute(&self.cancel, &listener).await;
        display.finish_child(listener.child);

        let summary = task.summary(&result);
        match &result {
            Ok(outcome) => debug!("{}: {}", name, outcome),
            Err(e) => warn!("{}: {}", name, e),
        }

        if let Some(ref callback) = self.config.on_complete {
            callback(&summary);
        }
        summary
    }
}
