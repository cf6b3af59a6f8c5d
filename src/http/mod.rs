//! HTTP module containing the transport abstraction and its implementations.
//!
//! # Overview
//!
//! - [`client`] - HTTP client creation and middleware configuration
//! - [`transport`] - The [`Transport`] trait and its request/response types
//! - [`native`] - [`NativeTransport`], a plain reqwest client
//! - [`pooled`] - [`PooledTransport`], the middleware client with retries and tracing
//!
//! # Examples
//!
//! ```rust
//! use packfetch::http::{HttpClientConfig, NativeTransport, PooledTransport, Transport};
//! use std::sync::Arc;
//!
//! # fn example(pooled: bool) -> packfetch::Result<Arc<dyn Transport>> {
//! let config = HttpClientConfig::default();
//! let transport: Arc<dyn Transport> = if pooled {
//!     Arc::new(PooledTransport::new(config)?)
//! } else {
//!     Arc::new(NativeTransport::new(&config)?)
//! };
//! # Ok(transport)
//! # }
//! ```

pub mod client;
pub mod native;
pub mod pooled;
pub mod transport;

pub use client::{create_http_client, create_native_client, HttpClientConfig};
pub use native::NativeTransport;
pub use pooled::PooledTransport;
pub use transport::{BodyStream, FetchRequest, FetchResponse, Transport};
