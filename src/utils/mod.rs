//! Shared utility functions.
//!
//! The utils module currently contains:
//!
//! - [`content_length`] - Length and range parsing of HTTP response headers

pub mod content_length;

// Re-export commonly used utilities
pub use content_length::{
    content_length, parse_content_range_start, parse_content_range_total, range_start,
    total_length,
};
