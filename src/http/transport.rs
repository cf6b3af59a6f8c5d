//! The network seam of the download engine.
//!
//! A [`Transport`] performs one streaming GET. It does not interpret status
//! codes: a `404` or `304` comes back as an ordinary [`FetchResponse`] and the
//! engine decides what it means. Only failures to obtain a response at all
//! (refused connections, timeouts, TLS errors) and broken body streams are
//! reported as [`Error::Transport`].
//!
//! Two implementations ship with the crate, picked when the engine is built:
//!
//! - [`NativeTransport`](super::NativeTransport) on a plain `reqwest::Client`
//! - [`PooledTransport`](super::PooledTransport) on the middleware client with
//!   retries and request tracing

use crate::error::{Error, Result};
use crate::utils::{range_start, total_length};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, RANGE,
};
use reqwest::StatusCode;
use std::fmt;

/// Streaming response body.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Parameters of a single GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchRequest {
    /// Absolute URL.
    pub url: String,
    /// Send `Range: bytes=<offset>-` when set.
    pub range_start: Option<u64>,
    /// Send `If-None-Match` with this ETag.
    pub if_none_match: Option<String>,
    /// Send `If-Modified-Since` with this HTTP date.
    pub if_modified_since: Option<String>,
}

impl FetchRequest {
    /// A plain GET for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Resume from `offset`. An offset of 0 sends no Range header.
    pub fn range_from(mut self, offset: u64) -> Self {
        self.range_start = (offset > 0).then_some(offset);
        self
    }

    /// The conditional and range headers this request needs.
    ///
    /// Header values that are not valid HTTP header text are skipped.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(offset) = self.range_start {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes={}-", offset)) {
                headers.insert(RANGE, value);
            }
        }
        if let Some(value) = self
            .if_none_match
            .as_deref()
            .and_then(|etag| HeaderValue::from_str(etag).ok())
        {
            headers.insert(IF_NONE_MATCH, value);
        }
        if let Some(value) = self
            .if_modified_since
            .as_deref()
            .and_then(|date| HeaderValue::from_str(date).ok())
        {
            headers.insert(IF_MODIFIED_SINCE, value);
        }
        headers
    }
}

/// Status, caching headers and body of a response.
pub struct FetchResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// `ETag` header.
    pub etag: Option<String>,
    /// `Last-Modified` header, unparsed.
    pub last_modified: Option<String>,
    /// Size of the whole resource, if announced.
    pub total_length: Option<u64>,
    /// First byte position the body starts at.
    pub body_offset: u64,
    /// The response body.
    pub body: BodyStream,
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("etag", &self.etag)
            .field("last_modified", &self.last_modified)
            .field("total_length", &self.total_length)
            .field("body_offset", &self.body_offset)
            .finish_non_exhaustive()
    }
}

impl FetchResponse {
    /// Assemble a response from raw status and headers.
    pub fn from_parts(status: StatusCode, headers: &HeaderMap, body: BodyStream) -> Self {
        let header_text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(String::from)
        };
        Self {
            status,
            etag: header_text(ETAG),
            last_modified: header_text(LAST_MODIFIED),
            total_length: total_length(status, headers),
            body_offset: range_start(status, headers),
            body,
        }
    }

    /// Map a reqwest response for `url`, turning body errors into transport errors.
    pub fn from_response(url: &str, response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let url = url.to_string();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| Error::transport(url.as_str(), e)))
            .boxed();
        Self::from_parts(status, &headers, body)
    }

    /// Collect the whole body as UTF-8 text. Meant for small resources.
    pub async fn text(self, url: &str) -> Result<String> {
        use futures::TryStreamExt;

        let body: Vec<u8> = self
            .body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await?;
        String::from_utf8(body).map_err(|e| Error::transport(url, e))
    }

    /// `304 Not Modified`.
    pub fn is_not_modified(&self) -> bool {
        self.status == StatusCode::NOT_MODIFIED
    }

    /// `206 Partial Content`.
    pub fn is_partial(&self) -> bool {
        self.status == StatusCode::PARTIAL_CONTENT
    }
}

/// Performs streaming GET requests.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Send `request` and return the response head with a streaming body.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;

    /// Fetch a small text resource, failing on non-2xx statuses.
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.fetch(&FetchRequest::new(url)).await?;
        if !response.status.is_success() {
            return Err(Error::transport(url, format!("HTTP {}", response.status)));
        }
        response.text(url).await
    }
}
