//! Typed block queries on top of the gateway.
//!
//! Every query degrades to an empty value when the gateway yields nothing,
//! so callers treat "no data" as "nothing to scan".

use serde_json::{Value, json};
use solana_client::rpc_config::RpcBlockConfig;
use solana_client::rpc_request::RpcRequest;
use solana_sdk::clock::{Slot, UnixTimestamp};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_transaction_status::{TransactionDetails, UiTransactionEncoding};
use std::sync::Arc;

use super::gateway::RpcGateway;
use crate::common::logging::{self, Logger};

/// Resolves the window of recent finalized blocks and fetches their contents.
pub struct BlockWindowResolver {
    gateway: Arc<RpcGateway>,
    logger: Arc<dyn Logger>,
}

impl BlockWindowResolver {
    pub fn new(gateway: Arc<RpcGateway>) -> Self {
        Self {
            gateway,
            logger: logging::noop(),
        }
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    #[must_use]
    pub fn gateway(&self) -> &RpcGateway {
        &self.gateway
    }

    /// Latest finalized slot.
    pub async fn latest_slot(&self) -> Option<Slot> {
        let result = self
            .gateway
            .call(RpcRequest::GetSlot, json!([CommitmentConfig::finalized()]))
            .await?;
        let slot = result.as_u64();
        if slot.is_none() {
            self.logger
                .error(&format!("getSlot returned a non-integer result: {result}"));
        }
        slot
    }

    /// Queries the latest slot once and logs it; used as a connectivity check.
    pub async fn probe(&self) -> Option<Slot> {
        let slot = self.latest_slot().await;
        match slot {
            Some(slot) => self.logger.success(&format!(
                "Connected to {}. Latest finalized slot: {slot}",
                self.gateway.url()
            )),
            None => self.logger.error(&format!(
                "Failed to reach RPC endpoint {}",
                self.gateway.url()
            )),
        }
        slot
    }

    /// Confirmed blocks in the inclusive range `[start, end]`.
    pub async fn blocks_in_range(&self, start: Slot, end: Slot) -> Option<Vec<Slot>> {
        let result = self
            .gateway
            .call(
                RpcRequest::GetBlocks,
                json!([start, end, CommitmentConfig::finalized()]),
            )
            .await?;

        match serde_json::from_value(result) {
            Ok(slots) => Some(slots),
            Err(e) => {
                self.logger
                    .error(&format!("getBlocks returned an unexpected result: {e}"));
                None
            }
        }
    }

    /// Unix timestamp of the block at `slot`, if the node has one.
    pub async fn block_time(&self, slot: Slot) -> Option<UnixTimestamp> {
        self.gateway
            .call(RpcRequest::GetBlockTime, json!([slot]))
            .await?
            .as_i64()
    }

    /// The last `limit` slots' blocks with their timestamps, newest first.
    ///
    /// Slots without a block time are dropped. An unreachable node yields an
    /// empty window.
    pub async fn get_recent_blocks(&self, limit: u64) -> Vec<(Slot, UnixTimestamp)> {
        let Some(latest) = self.latest_slot().await else {
            self.logger
                .error("Failed to get latest slot; nothing to scan");
            return Vec::new();
        };
        self.logger
            .info(&format!("Getting recent blocks. Latest slot: {latest}"));

        let start = latest.saturating_sub(limit);
        let Some(slots) = self.blocks_in_range(start, latest).await else {
            self.logger.error("Failed to get recent blocks");
            return Vec::new();
        };

        let mut blocks = Vec::with_capacity(slots.len());
        for slot in slots {
            match self.block_time(slot).await {
                Some(block_time) => blocks.push((slot, block_time)),
                None => self
                    .logger
                    .debug(&format!("Dropping slot {slot}: no block time")),
            }
        }

        blocks.sort_unstable_by(|a, b| b.0.cmp(&a.0));
        blocks
    }

    /// Raw transactions of the block at `slot`, in block order.
    pub async fn block_transactions(&self, slot: Slot) -> Vec<Value> {
        let config = RpcBlockConfig {
            encoding: Some(UiTransactionEncoding::Json),
            transaction_details: Some(TransactionDetails::Full),
            rewards: Some(false),
            commitment: Some(CommitmentConfig::finalized()),
            max_supported_transaction_version: Some(0),
            ..RpcBlockConfig::default()
        };

        let Some(result) = self
            .gateway
            .call(RpcRequest::GetBlock, json!([slot, config]))
            .await
        else {
            return Vec::new();
        };

        match result {
            Value::Object(mut block) => match block.remove("transactions") {
                Some(Value::Array(transactions)) => transactions,
                _ => Vec::new(),
            },
            _ => {
                self.logger
                    .error(&format!("getBlock for slot {slot} returned a non-object result"));
                Vec::new()
            }
        }
    }
}
