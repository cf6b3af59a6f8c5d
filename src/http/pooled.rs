//! Transport on the middleware client with a shared connection pool.

use super::client::{create_http_client, HttpClientConfig};
use super::transport::{FetchRequest, FetchResponse, Transport};
use crate::error::{Error, Result};

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;

/// Fetches through [`create_http_client`]: connection pooling, exponential
/// backoff on transient failures and a tracing span per request.
#[derive(Debug, Clone)]
pub struct PooledTransport {
    client: ClientWithMiddleware,
}

impl PooledTransport {
    /// Build the transport and its client from `config`.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client(config)?,
        })
    }

    /// Wrap an existing middleware client.
    pub fn from_client(client: ClientWithMiddleware) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for PooledTransport {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        debug!("GET {} (range: {:?}, pooled)", request.url, request.range_start);
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
