//! JSON-RPC gateway with bounded retries.
//!
//! Every call gets a fresh id from the gateway's counter. Failures never
//! surface as errors: after the last attempt the call yields `None` and the
//! caller skips that unit of work.

use serde_json::Value;
use solana_client::rpc_request::RpcRequest;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;

use super::transport::{HttpTransport, ReqwestTransport};
use crate::common::error::{Result, ScannerError};
use crate::common::logging::{self, Logger};
use crate::config::{RetryPolicy, ScannerConfig};

/// Issues JSON-RPC calls against one endpoint.
pub struct RpcGateway {
    url: String,
    transport: Arc<dyn HttpTransport>,
    retry: RetryPolicy,
    timeout: Duration,
    calls: AtomicU64,
    logger: Arc<dyn Logger>,
}

impl RpcGateway {
    pub fn new(
        url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            url: url.into(),
            transport,
            retry,
            timeout,
            calls: AtomicU64::new(0),
            logger: logging::noop(),
        }
    }

    /// Gateway over `reqwest` using the endpoint, retry policy and timeout of `config`.
    #[must_use]
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            config.rpc_url.clone(),
            Arc::new(ReqwestTransport::new()),
            config.retry,
            config.request_timeout,
        )
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of calls issued so far (retries are not counted).
    #[must_use]
    pub fn calls_issued(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Calls `request` with positional `params` and returns its `result`.
    ///
    /// Yields `None` when every attempt failed, when the endpoint answered
    /// with a JSON-RPC error, or when the result is missing or null.
    pub async fn call(&self, request: RpcRequest, params: Value) -> Option<Value> {
        let id = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if self.retry.should_throttle(id) {
            self.logger
                .debug(&format!("Throttling before call #{id} ({request})"));
            sleep(self.retry.throttle_delay).await;
        }

        let body = request.build_request_json(id, params);
        let envelope = self.send_with_retry(request, &body).await?;
        self.extract_result(request, envelope)
    }

    async fn send_with_retry(&self, request: RpcRequest, body: &Value) -> Option<Value> {
        let attempts = self.retry.max_attempts;

        for attempt in 0..attempts {
            let delay = self.retry.backoff_delay(attempt);
            if !delay.is_zero() {
                sleep(delay).await;
            }

            match self.transport.post(&self.url, body, self.timeout).await {
                Ok(response) if response.is_success() => match response.body {
                    Some(envelope) => return Some(envelope),
                    None => self.logger.error(&format!(
                        "{request} returned a non-JSON body (attempt {})",
                        attempt + 1
                    )),
                },
                Ok(response) => self.logger.warn(&format!(
                    "{request} failed with status {} (attempt {})",
                    response.status,
                    attempt + 1
                )),
                Err(e) => self.logger.error(&format!(
                    "RPC request {request} failed (attempt {}): {e}",
                    attempt + 1
                )),
            }
        }

        self.logger
            .error(&format!("{request} gave up after {attempts} attempts"));
        None
    }

    fn extract_result(&self, request: RpcRequest, envelope: Value) -> Option<Value> {
        match rpc_result(envelope) {
            Ok(Some(result)) => Some(result),
            Ok(None) => {
                self.logger
                    .error(&format!("{request} returned no result"));
                None
            }
            Err(e) => {
                self.logger.error(&format!("{request} failed: {e}"));
                None
            }
        }
    }
}

/// Takes the `result` out of a JSON-RPC response envelope.
///
/// A missing or null `result` is `Ok(None)`.
///
/// # Errors
///
/// Returns `RpcError` when the envelope carries an `error` object.
pub fn rpc_result(mut envelope: Value) -> Result<Option<Value>> {
    if let Some(error) = envelope.get("error") {
        let message = match (
            error.get("code").and_then(Value::as_i64),
            error.get("message").and_then(Value::as_str),
        ) {
            (Some(code), Some(message)) => format!("{message} (code {code})"),
            _ => error.to_string(),
        };
        return Err(ScannerError::RpcError(message));
    }

    match envelope.get_mut("result").map(Value::take) {
        Some(Value::Null) | None => Ok(None),
        Some(result) => Ok(Some(result)),
    }
}
