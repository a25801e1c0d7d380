//! Scanner configuration.
//!
//! Built with [`ScannerConfigBuilder`], either directly or seeded from the
//! environment (`.env` is loaded by the binary through `dotenvy`).

use rand::seq::SliceRandom;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::error::{Result, ScannerError};

/// Public mainnet endpoints used when no RPC URL is configured.
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "https://api.mainnet-beta.solana.com",
    "https://solana-mainnet.g.alchemy.com/v2/demo",
    "https://solana.public-rpc.com",
    "https://solana-api.projectserum.com",
];

pub const DEFAULT_MIN_AMOUNT: f64 = 0.001;
pub const DEFAULT_TOLERANCE: f64 = 0.1;
pub const DEFAULT_BLOCK_LIMIT: u64 = 100;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay schedule between attempts of one RPC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Wait `attempt_index * unit` before attempt `attempt_index` (0-based).
    Linear(Duration),
}

/// Retry and self-throttle settings for the RPC gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first one.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Pause every n-th call; 0 disables the throttle.
    pub throttle_every: u64,
    pub throttle_delay: Duration,
}

impl RetryPolicy {
    /// Same attempt count as the default, without any sleeping.
    #[must_use]
    pub fn none() -> Self {
        Self {
            backoff: Backoff::None,
            throttle_every: 0,
            throttle_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Delay to wait before the attempt with the given 0-based index.
    #[must_use]
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Linear(unit) => unit.saturating_mul(attempt_index),
        }
    }

    /// Whether the call carrying this counter value pauses first.
    #[must_use]
    pub fn should_throttle(&self, call_number: u64) -> bool {
        self.throttle_every > 0 && call_number % self.throttle_every == 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear(Duration::from_secs(1)),
            throttle_every: 10,
            throttle_delay: Duration::from_millis(100),
        }
    }
}

/// Validated scanner configuration.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub rpc_url: String,
    /// Balance changes smaller than this (in SOL) are noise.
    pub min_amount_threshold: f64,
    /// Allowed |a + b| for two changes to count as one transfer's two sides.
    pub counterparty_tolerance: f64,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    /// Append `meta.loadedAddresses` to the static account keys.
    pub include_loaded_addresses: bool,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
}

/// Builder for [`ScannerConfig`].
#[derive(Debug, Clone)]
pub struct ScannerConfigBuilder {
    rpc_url: Option<String>,
    min_amount: f64,
    counterparty_tolerance: Option<f64>,
    retry: RetryPolicy,
    request_timeout: Duration,
    include_loaded_addresses: bool,
    log_file: Option<PathBuf>,
    debug: bool,
}

impl Default for ScannerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rpc_url: None,
            min_amount: DEFAULT_MIN_AMOUNT,
            counterparty_tolerance: None,
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            include_loaded_addresses: false,
            log_file: None,
            debug: false,
        }
    }

    /// Seeds a builder from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set but does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Seeds a builder from an arbitrary key lookup.
    ///
    /// Recognized keys: `RPC_URL`, `SCANNER_MIN_AMOUNT`, `SCANNER_LOG_FILE`,
    /// `SCANNER_REQUEST_TIMEOUT_SECS`, `SCANNER_INCLUDE_LOADED_ADDRESSES`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a value is present but does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::new();

        if let Some(url) = lookup("RPC_URL") {
            builder = builder.with_rpc(url);
        }
        if let Some(raw) = lookup("SCANNER_MIN_AMOUNT") {
            builder = builder.with_min_amount(parse_var("SCANNER_MIN_AMOUNT", &raw)?);
        }
        if let Some(path) = lookup("SCANNER_LOG_FILE") {
            builder = builder.with_log_file(path);
        }
        if let Some(raw) = lookup("SCANNER_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = parse_var("SCANNER_REQUEST_TIMEOUT_SECS", &raw)?;
            builder = builder.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(raw) = lookup("SCANNER_INCLUDE_LOADED_ADDRESSES") {
            builder = builder
                .with_loaded_addresses(parse_var("SCANNER_INCLUDE_LOADED_ADDRESSES", &raw)?);
        }

        Ok(builder)
    }

    /// Sets the RPC endpoint. Blank values fall back to a public endpoint.
    #[must_use]
    pub fn with_rpc(mut self, url: impl Into<String>) -> Self {
        let url = url.into().trim().to_string();
        self.rpc_url = if url.is_empty() { None } else { Some(url) };
        self
    }

    #[must_use]
    pub fn with_min_amount(mut self, min_amount: f64) -> Self {
        self.min_amount = min_amount;
        self
    }

    /// Overrides the pairing tolerance, which otherwise equals the minimum amount.
    #[must_use]
    pub fn with_counterparty_tolerance(mut self, tolerance: f64) -> Self {
        self.counterparty_tolerance = Some(tolerance);
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_loaded_addresses(mut self, include: bool) -> Self {
        self.include_loaded_addresses = include;
        self
    }

    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Minimum amount currently set, the default for the interactive prompt.
    #[must_use]
    pub fn min_amount(&self) -> f64 {
        self.min_amount
    }

    /// Validates the settings and produces a [`ScannerConfig`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a non-positive minimum amount, a negative
    /// counterparty tolerance, a zero timeout, zero attempts or a non-HTTP URL.
    pub fn build(self) -> Result<ScannerConfig> {
        if !self.min_amount.is_finite() || self.min_amount <= 0.0 {
            return Err(ScannerError::ConfigError(format!(
                "minimum amount must be positive, got {}",
                self.min_amount
            )));
        }

        let counterparty_tolerance = self.counterparty_tolerance.unwrap_or(self.min_amount);
        if !counterparty_tolerance.is_finite() || counterparty_tolerance < 0.0 {
            return Err(ScannerError::ConfigError(format!(
                "counterparty tolerance must be non-negative, got {counterparty_tolerance}"
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(ScannerError::ConfigError(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ScannerError::ConfigError(
                "retry policy needs at least one attempt".to_string(),
            ));
        }

        let rpc_url = match self.rpc_url {
            Some(url) => url,
            None => random_public_endpoint().to_string(),
        };
        if !(rpc_url.starts_with("http://") || rpc_url.starts_with("https://")) {
            return Err(ScannerError::ConfigError(format!(
                "RPC URL must use http or https: {rpc_url}"
            )));
        }

        Ok(ScannerConfig {
            rpc_url,
            min_amount_threshold: self.min_amount,
            counterparty_tolerance,
            retry: self.retry,
            request_timeout: self.request_timeout,
            include_loaded_addresses: self.include_loaded_addresses,
            log_file: self.log_file,
            debug: self.debug,
        })
    }
}

/// Picks one of [`PUBLIC_ENDPOINTS`] at random.
#[must_use]
pub fn random_public_endpoint() -> &'static str {
    PUBLIC_ENDPOINTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PUBLIC_ENDPOINTS[0])
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ScannerError::ConfigError(format!("{key} has an invalid value: {raw}")))
}
