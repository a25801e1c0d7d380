//! # solana-amount-scanner
//!
//! Scans a window of recent finalized Solana blocks for transactions whose
//! net SOL transfer lands within a tolerance of a target amount.
//!
//! ```no_run
//! use solana_amount_scanner::{ScannerConfigBuilder, TransactionScanner, logging};
//!
//! # async fn run() -> solana_amount_scanner::Result<()> {
//! let config = ScannerConfigBuilder::new()
//!     .with_rpc("https://api.mainnet-beta.solana.com")
//!     .with_min_amount(0.001)
//!     .build()?;
//!
//! let scanner = TransactionScanner::new(config, logging::noop());
//! for found in scanner.scan(1.5, 50, 0.01).await? {
//!     println!("{} moved {} SOL", found.tx_hash, found.amount);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_precision_loss,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

pub mod common;
pub mod config;
pub mod core;
pub mod prompt;
pub mod report;
pub mod sources;
pub mod types;

pub use common::error::{Result, ScannerError};
pub use common::logging::{self, LogLevel, Logger, NoopLogger, TracingLogger};
pub use config::{Backoff, RetryPolicy, ScannerConfig, ScannerConfigBuilder};
pub use crate::core::{
    MatchCriteria, MatchOutcome, NoProgress, ScanProgress, ScanReport, SkipReason, SkipStats,
    TransactionScanner, TransferMatcher, extract_balance_changes, match_transfer,
};
pub use sources::{BlockWindowResolver, HttpTransport, ReqwestTransport, RpcGateway, TransportResponse};
pub use types::{BalanceChange, BalanceChanges, MatchedTransfer, ScanMatch, TransactionRecord};
