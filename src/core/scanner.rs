//! Scan orchestration: window → blocks → transactions → matches.
//!
//! Blocks are processed one at a time, newest first, and transactions in
//! block order, so the output order is deterministic.

use solana_sdk::clock::Slot;
use std::sync::Arc;

use super::matcher::{MatchCriteria, MatchOutcome, SkipReason, TransferMatcher};
use crate::common::error::Result;
use crate::common::logging::Logger;
use crate::config::ScannerConfig;
use crate::sources::{BlockWindowResolver, HttpTransport, ReqwestTransport, RpcGateway};
use crate::types::{ScanMatch, TransactionRecord};

/// Observer for scan progress. Both hooks default to doing nothing.
pub trait ScanProgress: Send + Sync {
    /// Called before block `index` (1-based) of `total` is fetched.
    fn on_block(&self, _index: usize, _total: usize, _slot: Slot) {}

    fn on_complete(&self, _report: &ScanReport) {}
}

/// Ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ScanProgress for NoProgress {}

/// Count of skipped transactions per reason.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SkipStats {
    pub failed: usize,
    pub empty_balances: usize,
    pub empty_account_keys: usize,
    pub no_significant_change: usize,
    pub out_of_range: usize,
    pub malformed: usize,
}

impl SkipStats {
    pub fn record(&mut self, reason: &SkipReason) {
        let counter = match reason {
            SkipReason::Failed => &mut self.failed,
            SkipReason::EmptyBalances => &mut self.empty_balances,
            SkipReason::EmptyAccountKeys => &mut self.empty_account_keys,
            SkipReason::NoSignificantChange => &mut self.no_significant_change,
            SkipReason::OutOfRange => &mut self.out_of_range,
            SkipReason::Malformed(_) => &mut self.malformed,
        };
        *counter += 1;
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.failed
            + self.empty_balances
            + self.empty_account_keys
            + self.no_significant_change
            + self.out_of_range
            + self.malformed
    }
}

/// Everything one scan produced.
#[derive(Debug, Default, Clone)]
pub struct ScanReport {
    /// Matches in visiting order: newest block first, block order within.
    pub matches: Vec<ScanMatch>,
    pub blocks_scanned: usize,
    pub transactions_seen: usize,
    pub skipped: SkipStats,
}

/// Scans a window of recent blocks for transfers of a given size.
pub struct TransactionScanner {
    config: ScannerConfig,
    resolver: BlockWindowResolver,
    logger: Arc<dyn Logger>,
    progress: Arc<dyn ScanProgress>,
}

impl TransactionScanner {
    /// Scanner talking to `config.rpc_url` over HTTP.
    pub fn new(config: ScannerConfig, logger: Arc<dyn Logger>) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()), logger)
    }

    /// Scanner over a caller-supplied transport.
    pub fn with_transport(
        config: ScannerConfig,
        transport: Arc<dyn HttpTransport>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let gateway = RpcGateway::new(
            config.rpc_url.clone(),
            transport,
            config.retry,
            config.request_timeout,
        )
        .with_logger(logger.clone());
        let resolver = BlockWindowResolver::new(Arc::new(gateway)).with_logger(logger.clone());

        logger.info(&format!(
            "Scanner initialized with RPC endpoint: {}",
            config.rpc_url
        ));

        Self {
            config,
            resolver,
            logger,
            progress: Arc::new(NoProgress),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ScanProgress>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.config.rpc_url
    }

    #[must_use]
    pub fn resolver(&self) -> &BlockWindowResolver {
        &self.resolver
    }

    /// Checks the endpoint by fetching the latest finalized slot.
    pub async fn connect(&self) -> Option<Slot> {
        self.resolver.probe().await
    }

    /// Scans the last `block_limit` slots for transfers of `target_amount ±
    /// tolerance` SOL and returns them in visiting order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive target or a negative
    /// tolerance. RPC failures only shrink the result.
    pub async fn scan(
        &self,
        target_amount: f64,
        block_limit: u64,
        tolerance: f64,
    ) -> Result<Vec<ScanMatch>> {
        Ok(self
            .scan_detailed(target_amount, block_limit, tolerance)
            .await?
            .matches)
    }

    /// Like [`scan`](Self::scan) but also returns block, transaction and skip counts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a non-positive target or a negative tolerance.
    pub async fn scan_detailed(
        &self,
        target_amount: f64,
        block_limit: u64,
        tolerance: f64,
    ) -> Result<ScanReport> {
        let criteria = MatchCriteria::new(
            target_amount,
            tolerance,
            self.config.min_amount_threshold,
        )?
        .with_counterparty_tolerance(self.config.counterparty_tolerance)?;
        let matcher =
            TransferMatcher::new(criteria).with_loaded_addresses(self.config.include_loaded_addresses);

        self.logger.info(&format!(
            "Starting scan for {target_amount} ±{tolerance} SOL transactions over {block_limit} blocks"
        ));

        let mut report = ScanReport::default();
        let blocks = self.resolver.get_recent_blocks(block_limit).await;
        if blocks.is_empty() {
            self.logger.warn("No blocks retrieved");
            self.progress.on_complete(&report);
            return Ok(report);
        }

        let total = blocks.len();
        for (index, (slot, block_time)) in blocks.into_iter().enumerate() {
            let index = index + 1;
            self.logger
                .info(&format!("Scanning block {index}/{total} at slot {slot}"));
            self.progress.on_block(index, total, slot);

            let transactions = self.resolver.block_transactions(slot).await;
            report.transactions_seen += transactions.len();
            report.blocks_scanned += 1;

            for raw in &transactions {
                let outcome = match TransactionRecord::from_value(
                    raw,
                    self.config.include_loaded_addresses,
                ) {
                    Ok(record) => match matcher.match_transaction(&record) {
                        MatchOutcome::Matched(transfer) => {
                            self.logger.debug(&format!(
                                "Match at slot {slot}: {} ({} SOL)",
                                record.signature, transfer.amount
                            ));
                            report.matches.push(ScanMatch::new(
                                record.signature,
                                slot,
                                block_time,
                                transfer,
                            ));
                            continue;
                        }
                        MatchOutcome::Skipped(reason) => reason,
                    },
                    Err(e) => {
                        self.logger
                            .error(&format!("Error parsing transaction at slot {slot}: {e}"));
                        SkipReason::Malformed(e.to_string())
                    }
                };
                self.logger
                    .debug(&format!("Skipping tx at slot {slot}: {outcome}"));
                report.skipped.record(&outcome);
            }
        }

        self.logger.info(&format!(
            "Scan complete. Processed {} transactions across {} blocks, {} matches",
            report.transactions_seen,
            report.blocks_scanned,
            report.matches.len()
        ));
        self.progress.on_complete(&report);

        Ok(report)
    }
}
