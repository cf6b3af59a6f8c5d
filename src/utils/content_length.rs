//! Length and range header parsing.
//!
//! Supports both `Content-Range` (partial responses to resumed requests) and
//! `Content-Length` headers.

use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_RANGE};
use reqwest::StatusCode;

/// Parse Content-Range header to extract total size.
///
/// Content-Range header format: "bytes start-end/total"
///
/// # Example
///
/// ```rust
/// use packfetch::utils::parse_content_range_total;
///
/// let total = parse_content_range_total("bytes 0-1023/2048");
/// assert_eq!(total, Some(2048));
/// assert_eq!(parse_content_range_total("bytes 0-1023/*"), None);
/// ```
pub fn parse_content_range_total(content_range: &str) -> Option<u64> {
    content_range
        .split('/')
        .next_back()
        .and_then(|size| size.trim().parse::<u64>().ok())
}

/// Parse Content-Range header to extract the first byte position.
///
/// ```rust
/// use packfetch::utils::parse_content_range_start;
///
/// assert_eq!(parse_content_range_start("bytes 200-1023/1024"), Some(200));
/// assert_eq!(parse_content_range_start("bytes */1024"), None);
/// ```
pub fn parse_content_range_start(content_range: &str) -> Option<u64> {
    content_range
        .trim()
        .strip_prefix("bytes")?
        .trim_start()
        .split('-')
        .next()
        .and_then(|start| start.trim().parse::<u64>().ok())
}

/// Value of the `Content-Length` header, if present and numeric.
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

/// Size of the complete resource behind a response.
///
/// For `206 Partial Content` this is the total from `Content-Range`, for
/// anything else the `Content-Length`.
pub fn total_length(status: StatusCode, headers: &HeaderMap) -> Option<u64> {
    if status == StatusCode::PARTIAL_CONTENT {
        if let Some(total) = headers
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
        {
            return Some(total);
        }
    }
    content_length(headers)
}

/// First byte position served by a partial response, 0 for anything else.
pub fn range_start(status: StatusCode, headers: &HeaderMap) -> u64 {
    if status != StatusCode::PARTIAL_CONTENT {
        return 0;
    }
    headers
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range_start)
        .unwrap_or(0)
}
