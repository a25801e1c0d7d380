//! Error types for the amount scanner.
//!
//! RPC and data failures inside a scan never reach the caller as errors; they
//! degrade to empty results. `ScannerError` covers the boundaries: invalid
//! parameters, configuration, I/O and the transport primitive itself.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ScannerError>;

/// Errors raised by the scanner and its collaborators.
#[derive(Debug, Error)]
pub enum ScannerError {
    /// The JSON-RPC endpoint answered with something unusable.
    #[error("RPC error: {0}")]
    RpcError(String),

    /// The HTTP transport failed before a response was received.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A scan or match parameter is outside its allowed range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A transaction payload matched none of the known shapes.
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<reqwest::Error> for ScannerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TransportError(format!("request timed out: {err}"))
        } else {
            Self::TransportError(err.to_string())
        }
    }
}
