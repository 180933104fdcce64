//! HTTP access to the trending, price and chart endpoints.

pub mod schema;
#[cfg(test)]
pub(crate) mod mock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

/// A raw upstream response: status plus body bytes, unparsed.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Performs a single GET. Errors mean no response was obtained at all;
/// non-success statuses come back as a normal [`UpstreamResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse> {
        debug!("GET {url}");

        let resp = self
            .client
            .get(url.clone())
            .header("accept", "application/json")
            .send()
            .await
            .with_context(|| format!("request to {} failed", url.path()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .context("Failed to read response body")?
            .to_vec();

        Ok(UpstreamResponse { status, body })
    }
}
