//! Error handling for packfetch.
//!
//! Errors are split along the line the download engine cares about: failures
//! that are specific to one remote location (transport and validation) are
//! retried against the next mirror, everything else is terminal. Once every
//! mirror has been tried the engine reports a single
//! [`Error::ExhaustedMirrors`], the per-mirror details only go to the log.
//!
//! Cancellation is not an error, see
//! [`Outcome::Cancelled`](crate::download::Outcome::Cancelled).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen when fetching files.
#[derive(Error, Debug)]
pub enum Error {
    /// Error from an underlying system.
    ///
    /// Captures failures that don't fit into other categories, such as a
    /// blocking worker that panicked.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Error from the underlying URL parser or the expected URL format.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The remote end could not deliver the file.
    ///
    /// Connection refused, timeouts, broken streams and non-2xx status codes
    /// all end up here. Recoverable by trying the next mirror.
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The downloaded bytes do not satisfy the validation spec.
    ///
    /// Recoverable by trying the next mirror, since mirrors may serve
    /// different content.
    #[error("Validation failed for {}: {reason}", path.display())]
    Validation { path: PathBuf, reason: String },

    /// Every URL of a task failed.
    #[error("All {attempts} location(s) failed for {url}")]
    ExhaustedMirrors { url: String, attempts: usize },

    /// Reading or writing a local file failed.
    ///
    /// This is not a network condition and is never retried against mirrors.
    #[error("Local I/O error on {}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O Error without a known path.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Failure while reading a local archive.
    #[error("Archive error: {message}")]
    Archive { message: String },

    /// Error from the Reqwest library.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },

    /// Error from the middleware stack of the pooled client.
    #[error("Middleware Error")]
    Middleware {
        #[from]
        source: reqwest_middleware::Error,
    },
}

impl Error {
    /// Build a transport error from anything displayable.
    pub fn transport(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Build a local I/O error bound to the path it happened on.
    pub fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Whether the engine should move on to the next mirror after this error.
    pub fn is_mirror_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. }
                | Error::Validation { .. }
                | Error::Reqwest { .. }
                | Error::Middleware { .. }
        )
    }
}

/// Result type alias for operations that can fail with a packfetch error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_retryable_classification() {
        assert!(Error::transport("http://a/b", "timed out").is_mirror_retryable());
        assert!(Error::Validation {
            path: PathBuf::from("x"),
            reason: "size".into()
        }
        .is_mirror_retryable());

        let local = Error::local_io("x", io::Error::other("disk full"));
        assert!(!local.is_mirror_retryable());
        assert!(!Error::ExhaustedMirrors {
            url: "http://a/b".into(),
            attempts: 2
        }
        .is_mirror_retryable());
        assert!(!Error::InvalidUrl("nope".into()).is_mirror_retryable());
    }

    #[test]
    fn test_display_messages() {
        let err = Error::ExhaustedMirrors {
            url: "https://example.com/a.jar".into(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "All 3 location(s) failed for https://example.com/a.jar"
        );

        let err = Error::transport("https://example.com/a.jar", "HTTP 500");
        assert!(err.to_string().contains("HTTP 500"));
    }
}
