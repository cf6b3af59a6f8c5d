//! Transport on a plain `reqwest::Client`.

use super::client::{create_native_client, HttpClientConfig};
use super::transport::{FetchRequest, FetchResponse, Transport};
use crate::error::{Error, Result};

use async_trait::async_trait;
use tracing::debug;

/// Fetches with a single reqwest client and no middleware.
///
/// Failures surface immediately so the engine can move to the next mirror
/// without waiting for backoff.
#[derive(Debug, Clone)]
pub struct NativeTransport {
    client: reqwest::Client,
}

impl NativeTransport {
    /// Build the transport and its client from `config`.
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        Ok(Self {
            client: create_native_client(config)?,
        })
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for NativeTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        debug!("GET {} (range: {:?})", request.url, request.range_start);
        let response = self
            .client
            .get(request.url.as_str())
            .headers(request.headers())
            .send()
            .await
            .map_err(|e| Error::transport(&request.url, e))?;
        Ok(FetchResponse::from_response(&request.url, response))
    }
}
