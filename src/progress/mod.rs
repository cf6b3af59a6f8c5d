//! Progress reporting for downloads.
//!
//! A task reports through a [`ProgressListener`], a callback taking one
//! [`ProgressEvent`] per received chunk plus a final `done` event. Listeners
//! run on the downloading task, so they must return quickly.
//!
//! # Overview
//!
//! - `aggregator` - [`ProgressAggregator`] folds events of many tasks into
//!   totals, speed and ETA
//! - `display` - [`ProgressDisplay`], indicatif bars for batch downloads
//! - `style` - Progress bar styling options and templates
//!
//! # Examples
//!
//! ```rust
//! use packfetch::progress::{ProgressAggregator, ProgressEvent, ProgressListener};
//!
//! let aggregator = ProgressAggregator::new();
//! let listener = aggregator.track();
//! listener.on_progress(ProgressEvent::chunk(512, 512, Some(1024)));
//!
//! let snapshot = aggregator.snapshot();
//! assert_eq!(snapshot.transferred, 512);
//! assert_eq!(snapshot.expected, 1024);
//! ```

pub(crate) mod aggregator;
pub(crate) mod display;
pub(crate) mod style;

pub use aggregator::{ProgressAggregator, ProgressSnapshot, TrackedProgress};
pub use display::{ChildProgress, ProgressDisplay};
pub use style::{ProgressBarOpts, StyleOptions};

/// One progress report of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes of the file present so far, a resumed prefix included.
    pub bytes: u64,
    /// Bytes received since the previous event.
    pub delta: u64,
    /// Expected size of the whole file, if known.
    pub total: Option<u64>,
    /// Set on the last event of a transfer.
    pub done: bool,
}

impl ProgressEvent {
    pub fn chunk(bytes: u64, delta: u64, total: Option<u64>) -> Self {
        Self {
            bytes,
            delta,
            total,
            done: false,
        }
    }

    pub fn finished(bytes: u64, total: Option<u64>) -> Self {
        Self {
            bytes,
            delta: 0,
            total,
            done: true,
        }
    }
}

/// Receives progress events of a task.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Listener that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressListener for NoProgress {
    fn on_progress(&self, _event: ProgressEvent) {}
}
