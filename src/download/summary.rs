//! Download results and task states.
//!
//! [`Outcome`] is what a successful or cancelled [`DownloadTask::execute`]
//! returns. [`Summary`] is the per-task record the batch
//! [`Downloader`](crate::downloader::Downloader) hands back, failures included.
//!
//! # Examples
//!
//! ```rust
//! use packfetch::download::{Outcome, Summary};
//! use std::path::PathBuf;
//!
//! let summary = Summary::new("https://example.com/a.jar", PathBuf::from("a.jar"))
//!     .with_outcome(Outcome::Downloaded { bytes: 1024, resumed_from: 0 })
//!     .with_attempts(1);
//!
//! assert!(summary.is_success());
//! assert_eq!(summary.bytes(), 1024);
//! ```
//!
//! [`DownloadTask::execute`]: super::DownloadTask::execute

use crate::error::Error;

use std::fmt;
use std::path::{Path, PathBuf};

/// How a task reached its final state without failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The destination already satisfied the validation spec. No network I/O.
    Redundant,
    /// The bytes came from a local source locator. No network I/O.
    LocalCopy,
    /// The server answered `304 Not Modified`; the destination was kept.
    NotModified,
    /// The file was transferred and verified.
    Downloaded {
        /// Bytes received over the network in the successful attempt.
        bytes: u64,
        /// Offset the transfer resumed from, 0 for a fresh download.
        resumed_from: u64,
    },
    /// The server answered with a status the caller opted to accept as "nothing to fetch".
    Skipped(String),
    /// The cancellation token fired. A partial file may be left for resuming.
    Cancelled,
}

impl Outcome {
    /// Whether the destination now holds a verified file.
    pub fn is_installed(&self) -> bool {
        matches!(
            self,
            Outcome::Redundant | Outcome::LocalCopy | Outcome::NotModified | Outcome::Downloaded { .. }
        )
    }

    /// Bytes transferred over the network.
    pub fn bytes(&self) -> u64 {
        match self {
            Outcome::Downloaded { bytes, .. } => *bytes,
            _ => 0,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Redundant => write!(f, "already valid"),
            Outcome::LocalCopy => write!(f, "copied from local source"),
            Outcome::NotModified => write!(f, "not modified"),
            Outcome::Downloaded {
                bytes,
                resumed_from: 0,
            } => write!(f, "downloaded {} bytes", bytes),
            Outcome::Downloaded {
                bytes,
                resumed_from,
            } => write!(f, "downloaded {} bytes, resumed at {}", bytes, resumed_from),
            Outcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            Outcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Lifecycle of a single task.
///
/// `Pending -> (Redundant | LocalCopy | Fetching) -> Verifying -> (Installed | Failed | Cancelled)`.
/// `Fetching` may loop over mirrors before reaching `Verifying` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Redundant,
    LocalCopy,
    /// Fetching from the mirror at this index, 0 being the primary URL.
    Fetching(usize),
    Verifying,
    Installed,
    /// Ended with [`Outcome::Skipped`].
    Skipped,
    Failed,
    Cancelled,
}

impl TaskState {
    /// Terminal states are final: a task in one of them cannot be executed again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Installed | TaskState::Skipped | TaskState::Failed | TaskState::Cancelled
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Redundant => write!(f, "redundant"),
            TaskState::LocalCopy => write!(f, "local copy"),
            TaskState::Fetching(0) => write!(f, "fetching"),
            TaskState::Fetching(mirror) => write!(f, "fetching (mirror {})", mirror),
            TaskState::Verifying => write!(f, "verifying"),
            TaskState::Installed => write!(f, "installed"),
            TaskState::Skipped => write!(f, "skipped"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Represents the result of one task in a batch.
#[derive(Debug, Clone)]
pub struct Summary {
    /// URL that produced the result: the primary URL or the mirror that succeeded.
    url: String,
    /// Destination path.
    dest: PathBuf,
    /// Outcome, or the error message.
    result: Result<Outcome, String>,
    /// Number of locations tried.
    attempts: usize,
}

impl Summary {
    /// Create a new [`Summary`], initially a failure with no message.
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            result: Err(String::new()),
            attempts: 0,
        }
    }

    /// Attach an outcome.
    pub fn with_outcome(self, outcome: Outcome) -> Self {
        Self {
            result: Ok(outcome),
            ..self
        }
    }

    /// Mark the summary as failed.
    pub fn fail(self, error: &Error) -> Self {
        Self {
            result: Err(error.to_string()),
            ..self
        }
    }

    /// Record how many locations were tried.
    pub fn with_attempts(self, attempts: usize) -> Self {
        Self { attempts, ..self }
    }

    /// Record the URL that produced the result.
    pub fn with_url(self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// The outcome, if the task did not fail.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.result.as_ref().ok()
    }

    /// The error message, if the task failed.
    pub fn error(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Bytes transferred over the network.
    pub fn bytes(&self) -> u64 {
        self.outcome().map(Outcome::bytes).unwrap_or(0)
    }

    /// Whether the destination holds a verified file.
    pub fn is_success(&self) -> bool {
        self.outcome().is_some_and(Outcome::is_installed)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(outcome) => write!(f, "{}: {}", self.dest.display(), outcome),
            Err(message) => write!(f, "{}: failed: {}", self.dest.display(), message),
        }
    }
}
