//! Balance changes and matched transfers, in whole SOL.

use serde::ser::{Serialize, SerializeMap, Serializer};
use solana_sdk::clock::{Slot, UnixTimestamp};
use solana_sdk::native_token::LAMPORTS_PER_SOL;

/// Converts a raw lamport balance to SOL.
#[must_use]
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Net effect of one transaction on one account.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct BalanceChange {
    pub pre_balance: f64,
    pub post_balance: f64,
    /// `post_balance - pre_balance`.
    pub change: f64,
}

impl BalanceChange {
    #[must_use]
    pub fn from_lamports(pre: u64, post: u64) -> Self {
        let pre_balance = lamports_to_sol(pre);
        let post_balance = lamports_to_sol(post);
        Self {
            pre_balance,
            post_balance,
            change: post_balance - pre_balance,
        }
    }

    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.change.abs()
    }
}

/// Per-account balance changes of one transaction, in account-key order.
///
/// Re-inserting an account keeps its original position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceChanges {
    entries: Vec<(String, BalanceChange)>,
}

impl BalanceChanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, account: impl Into<String>, change: BalanceChange) {
        let account = account.into();
        match self.entries.iter_mut().find(|(key, _)| *key == account) {
            Some((_, existing)) => *existing = change,
            None => self.entries.push((account, change)),
        }
    }

    #[must_use]
    pub fn get(&self, account: &str) -> Option<&BalanceChange> {
        self.entries
            .iter()
            .find(|(key, _)| key == account)
            .map(|(_, change)| change)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BalanceChange)> {
        self.entries
            .iter()
            .map(|(account, change)| (account.as_str(), change))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every retained change.
    #[must_use]
    pub fn net_change(&self) -> f64 {
        self.entries.iter().map(|(_, change)| change.change).sum()
    }
}

impl Serialize for BalanceChanges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (account, change) in &self.entries {
            map.serialize_entry(account, change)?;
        }
        map.end()
    }
}

/// The transfer picked out of one transaction.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MatchedTransfer {
    /// Absolute value of the matched change.
    pub amount: f64,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub fee: f64,
    pub balance_changes: BalanceChanges,
}

/// A matched transfer together with where it was found.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScanMatch {
    /// First signature of the transaction.
    pub tx_hash: String,
    pub amount: f64,
    /// Slot of the containing block.
    pub slot: Slot,
    pub block_time: UnixTimestamp,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub fee: f64,
    pub balance_changes: BalanceChanges,
}

impl ScanMatch {
    #[must_use]
    pub fn new(
        tx_hash: impl Into<String>,
        slot: Slot,
        block_time: UnixTimestamp,
        transfer: MatchedTransfer,
    ) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            amount: transfer.amount,
            slot,
            block_time,
            sender: transfer.sender,
            receiver: transfer.receiver,
            fee: transfer.fee,
            balance_changes: transfer.balance_changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamports_to_sol() {
        assert_eq!(lamports_to_sol(LAMPORTS_PER_SOL), 1.0);
        assert_eq!(lamports_to_sol(5000), 0.000005);
        assert_eq!(lamports_to_sol(0), 0.0);
    }

    #[test]
    fn test_balance_change_sign() {
        let outgoing = BalanceChange::from_lamports(3_000_000_000, 1_000_000_000);
        assert_eq!(outgoing.change, -2.0);
        assert_eq!(outgoing.magnitude(), 2.0);

        let incoming = BalanceChange::from_lamports(0, 500_000_000);
        assert_eq!(incoming.change, 0.5);
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut changes = BalanceChanges::new();
        changes.insert("A", BalanceChange::from_lamports(0, 1_000_000_000));
        changes.insert("B", BalanceChange::from_lamports(0, 2_000_000_000));
        changes.insert("A", BalanceChange::from_lamports(0, 3_000_000_000));

        let order: Vec<&str> = changes.iter().map(|(account, _)| account).collect();
        assert_eq!(order, vec!["A", "B"]);
        assert_eq!(changes.get("A").unwrap().change, 3.0);
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let mut changes = BalanceChanges::new();
        changes.insert("Zed", BalanceChange::from_lamports(2_000_000_000, 1_000_000_000));
        changes.insert("Amy", BalanceChange::from_lamports(0, 1_000_000_000));

        let json = serde_json::to_string(&changes).unwrap();
        assert!(json.find("Zed").unwrap() < json.find("Amy").unwrap());
        assert!(json.contains("\"change\":-1.0"));
    }
}
