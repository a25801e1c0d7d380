//! In-memory transport for unit tests.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;

use super::transport::{HttpTransport, TransportResponse};
use crate::common::error::Result;
use crate::common::logging::{LogLevel, Logger};

type Handler = dyn Fn(&str, &Value) -> Result<TransportResponse> + Send + Sync;

/// Answers each request through a closure keyed on the JSON-RPC method.
pub struct FakeTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<Value>>,
}

impl FakeTransport {
    pub fn new(
        handler: impl Fn(&str, &Value) -> Result<TransportResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request body received so far, in order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Method names of every request received so far.
    pub fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|body| body["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn post(&self, _url: &str, body: &Value, _timeout: Duration) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(body.clone());
        let method = body["method"].as_str().unwrap_or_default();
        (self.handler)(method, &body["params"])
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<(LogLevel, String)>>,
}

impl RecordingLogger {
    pub fn events(&self) -> Vec<(LogLevel, String)> {
        self.events.lock().unwrap().clone()
    }

    /// Messages recorded at exactly `level`, in order.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(recorded, _)| *recorded == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.events.lock().unwrap().push((level, message.to_string()));
    }
}

/// A successful JSON-RPC envelope around `result`.
pub fn rpc_ok(result: Value) -> Result<TransportResponse> {
    Ok(TransportResponse::ok(json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": 1
    })))
}

/// A transaction as `getBlock` returns it with JSON encoding.
pub fn block_tx(
    signature: &str,
    keys: &[&str],
    pre: &[u64],
    post: &[u64],
    fee: u64,
    err: Value,
) -> Value {
    let status = if err.is_null() {
        json!({ "Ok": null })
    } else {
        json!({ "Err": err })
    };

    json!({
        "transaction": {
            "signatures": [signature],
            "message": {
                "header": {
                    "numRequiredSignatures": 1,
                    "numReadonlySignedAccounts": 0,
                    "numReadonlyUnsignedAccounts": 0
                },
                "accountKeys": keys,
                "instructions": [],
                "recentBlockhash": "11111111111111111111111111111111"
            }
        },
        "meta": {
            "err": err,
            "status": status,
            "fee": fee,
            "preBalances": pre,
            "postBalances": post
        },
        "version": "legacy"
    })
}
