//! Cache metadata persisted next to downloaded files.
//!
//! Every successful fetch that returned caching headers leaves a small
//! sidecar at `<dest>.etag`. The next fetch of the same destination reads it
//! back to send `If-None-Match` / `If-Modified-Since`.
//!
//! Two on-disk layouts exist and [`CacheSidecar::load`] understands both,
//! whichever wrote the file:
//!
//! - [`SidecarFormat::Json`]: `{"etag":"\"abc\"","last_modified":"2024-05-01T10:00:00Z"}`
//! - [`SidecarFormat::Text`]: the ETag on the first line, the HTTP date on the second

use crate::error::{Error, Result};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

const SIDECAR_SUFFIX: &str = ".etag";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// On-disk layout of a sidecar file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidecarFormat {
    /// Small JSON object.
    #[default]
    Json,
    /// Two plain text lines.
    Text,
}

/// Last known caching headers of a destination file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSidecar {
    /// Value of the `ETag` response header, quotes included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Value of the `Last-Modified` response header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// Path of the sidecar belonging to `dest`.
pub fn sidecar_path(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Parse an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc2822(value)
                .ok()
                .map(|date| date.with_timezone(&Utc))
        })
}

/// Format a timestamp as an IMF-fixdate for HTTP headers.
pub fn format_http_date(date: &DateTime<Utc>) -> String {
    date.format(HTTP_DATE_FORMAT).to_string()
}

impl CacheSidecar {
    /// Build sidecar data from raw response headers. Unparseable dates are dropped.
    pub fn from_headers(etag: Option<&str>, last_modified: Option<&str>) -> Self {
        Self {
            etag: etag
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from),
            last_modified: last_modified.and_then(parse_http_date),
        }
    }

    /// Whether there is anything worth persisting.
    pub fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }

    /// The `If-Modified-Since` header value, if a date is known.
    pub fn if_modified_since(&self) -> Option<String> {
        self.last_modified.as_ref().map(format_http_date)
    }

    /// Serialize in the given layout.
    pub fn render(&self, format: SidecarFormat) -> Result<String> {
        match format {
            SidecarFormat::Json => serde_json::to_string(self)
                .map_err(|e| Error::Internal(format!("Cannot encode sidecar: {}", e))),
            SidecarFormat::Text => Ok(format!(
                "{}\n{}\n",
                self.etag.as_deref().unwrap_or_default(),
                self.if_modified_since().unwrap_or_default()
            )),
        }
    }

    /// Parse either layout. Returns `None` for content that is neither.
    pub fn parse(content: &str) -> Option<Self> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed).ok();
        }

        let mut lines = content.lines();
        let etag = lines.next();
        let last_modified = lines.next();
        let sidecar = Self::from_headers(etag, last_modified);
        Some(sidecar)
    }

    /// Read the sidecar of `dest`. A missing or unreadable sidecar yields `None`.
    pub async fn load(dest: &Path) -> Option<Self> {
        let path = sidecar_path(dest);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Ignoring unreadable sidecar {:?}: {}", path, e);
                }
                return None;
            }
        };
        Self::parse(&content).filter(|sidecar| !sidecar.is_empty())
    }

    /// Write the sidecar of `dest`, replacing any previous one.
    pub async fn store(&self, dest: &Path, format: SidecarFormat) -> Result<()> {
        let path = sidecar_path(dest);
        let staging = {
            let mut name = path.as_os_str().to_owned();
            name.push(".tmp");
            PathBuf::from(name)
        };
        let content = self.render(format)?;
        tokio::fs::write(&staging, content)
            .await
            .map_err(|e| Error::local_io(&staging, e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| Error::local_io(&path, e))?;
        Ok(())
    }

    /// Delete the sidecar of `dest` if present.
    pub async fn remove(dest: &Path) -> Result<()> {
        let path = sidecar_path(dest);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::local_io(path, e)),
        }
    }
}
