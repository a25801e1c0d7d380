//! HTTP transport primitive used by the RPC gateway.
//!
//! The gateway only needs "a status and maybe a JSON body" or "failed"; it owns
//! retries itself, so transports must not retry on their own.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::common::error::Result;

/// Outcome of one HTTP POST that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// `None` when the body was not valid JSON.
    pub body: Option<Value>,
}

impl TransportResponse {
    #[must_use]
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Posts a JSON body to a URL.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `body` to `url`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when no response was received (connection
    /// failure, timeout).
    async fn post(&self, url: &str, body: &Value, timeout: Duration) -> Result<TransportResponse>;
}

/// [`HttpTransport`] on top of a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post(&self, url: &str, body: &Value, timeout: Duration) -> Result<TransportResponse> {
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.json::<Value>().await.ok();

        Ok(TransportResponse { status, body })
    }
}
