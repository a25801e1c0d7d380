//! Picks the transfer of a target size out of a transaction's balance changes.
//!
//! Matching is a pure function of the transaction and the criteria. A
//! transaction that cannot match is not an error: the matcher reports why it
//! was skipped and the scan moves on.

use serde_json::Value;
use std::fmt;

use super::extractor::extract_balance_changes;
use crate::common::error::{Result, ScannerError};
use crate::types::{BalanceChange, MatchedTransfer, TransactionRecord, lamports_to_sol};

/// What a transfer must look like to be reported. All amounts in SOL.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCriteria {
    pub target_amount: f64,
    /// Allowed absolute deviation from `target_amount`.
    pub tolerance: f64,
    /// Changes below this magnitude are ignored.
    pub min_threshold: f64,
    /// Allowed |a + b| for two changes to be the two sides of one transfer.
    pub counterparty_tolerance: f64,
}

impl MatchCriteria {
    /// Criteria whose counterparty tolerance equals `min_threshold`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless `target_amount > 0`, `tolerance >= 0`
    /// and `min_threshold > 0`, all finite.
    pub fn new(target_amount: f64, tolerance: f64, min_threshold: f64) -> Result<Self> {
        ensure(
            target_amount.is_finite() && target_amount > 0.0,
            format!("target amount must be positive, got {target_amount}"),
        )?;
        ensure(
            tolerance.is_finite() && tolerance >= 0.0,
            format!("tolerance must not be negative, got {tolerance}"),
        )?;
        ensure(
            min_threshold.is_finite() && min_threshold > 0.0,
            format!("minimum amount must be positive, got {min_threshold}"),
        )?;

        Ok(Self {
            target_amount,
            tolerance,
            min_threshold,
            counterparty_tolerance: min_threshold,
        })
    }

    /// Replaces the counterparty tolerance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative or non-finite value.
    pub fn with_counterparty_tolerance(mut self, tolerance: f64) -> Result<Self> {
        ensure(
            tolerance.is_finite() && tolerance >= 0.0,
            format!("counterparty tolerance must not be negative, got {tolerance}"),
        )?;
        self.counterparty_tolerance = tolerance;
        Ok(self)
    }

    /// Whether `magnitude` lies within `target_amount ± tolerance`, inclusive.
    #[must_use]
    pub fn in_range(&self, magnitude: f64) -> bool {
        (magnitude - self.target_amount).abs() <= self.tolerance
    }

    fn offsets(&self, a: &BalanceChange, b: &BalanceChange) -> bool {
        (a.change + b.change).abs() < self.counterparty_tolerance
    }
}

fn ensure(condition: bool, message: String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ScannerError::InvalidInput(message))
    }
}

/// Why a transaction produced no match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The transaction's status carried an error.
    Failed,
    EmptyBalances,
    EmptyAccountKeys,
    /// No balance change reached the minimum amount.
    NoSignificantChange,
    /// Significant changes exist but none is close enough to the target.
    OutOfRange,
    /// The payload could not be normalized.
    Malformed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed => f.write_str("transaction failed"),
            Self::EmptyBalances => f.write_str("no balance arrays"),
            Self::EmptyAccountKeys => f.write_str("no account keys"),
            Self::NoSignificantChange => f.write_str("no significant balance change"),
            Self::OutOfRange => f.write_str("no change within tolerance of the target"),
            Self::Malformed(reason) => write!(f, "malformed transaction: {reason}"),
        }
    }
}

/// Result of matching one transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(MatchedTransfer),
    Skipped(SkipReason),
}

impl MatchOutcome {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    #[must_use]
    pub fn into_matched(self) -> Option<MatchedTransfer> {
        match self {
            Self::Matched(transfer) => Some(transfer),
            Self::Skipped(_) => None,
        }
    }
}

/// Applies [`MatchCriteria`] to transactions.
#[derive(Debug, Clone, Copy)]
pub struct TransferMatcher {
    criteria: MatchCriteria,
    include_loaded_addresses: bool,
}

impl TransferMatcher {
    #[must_use]
    pub fn new(criteria: MatchCriteria) -> Self {
        Self {
            criteria,
            include_loaded_addresses: false,
        }
    }

    /// Count lookup-table addresses as account keys when normalizing raw payloads.
    #[must_use]
    pub fn with_loaded_addresses(mut self, include: bool) -> Self {
        self.include_loaded_addresses = include;
        self
    }

    #[must_use]
    pub fn criteria(&self) -> &MatchCriteria {
        &self.criteria
    }

    /// Normalizes a raw `getBlock` transaction and matches it.
    #[must_use]
    pub fn match_value(&self, value: &Value) -> MatchOutcome {
        match TransactionRecord::from_value(value, self.include_loaded_addresses) {
            Ok(record) => self.match_transaction(&record),
            Err(e) => MatchOutcome::Skipped(SkipReason::Malformed(e.to_string())),
        }
    }

    /// Finds the transfer closest to the criteria in `tx`.
    ///
    /// Among in-range changes the largest magnitude wins; on equal
    /// magnitudes the first account in key order wins. The counterparty is
    /// the first other significant change that offsets the winner.
    #[must_use]
    pub fn match_transaction(&self, tx: &TransactionRecord) -> MatchOutcome {
        if tx.failed {
            return MatchOutcome::Skipped(SkipReason::Failed);
        }
        if tx.pre_balances.is_empty() || tx.post_balances.is_empty() {
            return MatchOutcome::Skipped(SkipReason::EmptyBalances);
        }
        if tx.account_keys.is_empty() {
            return MatchOutcome::Skipped(SkipReason::EmptyAccountKeys);
        }

        let criteria = &self.criteria;
        let balance_changes = extract_balance_changes(
            &tx.pre_balances,
            &tx.post_balances,
            &tx.account_keys,
            criteria.min_threshold,
        );

        let candidates: Vec<(&str, &BalanceChange)> = balance_changes
            .iter()
            .filter(|(_, change)| change.magnitude() >= criteria.min_threshold)
            .collect();
        if candidates.is_empty() {
            return MatchOutcome::Skipped(SkipReason::NoSignificantChange);
        }

        let mut best: Option<(&str, &BalanceChange)> = None;
        for &(account, change) in &candidates {
            if !criteria.in_range(change.magnitude()) {
                continue;
            }
            if best.is_none_or(|(_, current)| change.magnitude() > current.magnitude()) {
                best = Some((account, change));
            }
        }
        let Some((best_account, best_change)) = best else {
            return MatchOutcome::Skipped(SkipReason::OutOfRange);
        };

        let counterparty = candidates
            .iter()
            .find(|(account, change)| {
                *account != best_account && criteria.offsets(change, best_change)
            })
            .map(|(account, _)| account.to_string());

        let (sender, receiver) = if best_change.change < 0.0 {
            (Some(best_account.to_string()), counterparty)
        } else {
            (counterparty, Some(best_account.to_string()))
        };

        let amount = best_change.magnitude();
        MatchOutcome::Matched(MatchedTransfer {
            amount,
            sender,
            receiver,
            fee: lamports_to_sol(tx.fee),
            balance_changes,
        })
    }
}

/// Matches one transaction with the counterparty tolerance tied to
/// `min_threshold`. Invalid parameters never match.
#[must_use]
pub fn match_transfer(
    tx: &TransactionRecord,
    target_amount: f64,
    tolerance: f64,
    min_threshold: f64,
) -> Option<MatchedTransfer> {
    let criteria = MatchCriteria::new(target_amount, tolerance, min_threshold).ok()?;
    TransferMatcher::new(criteria)
        .match_transaction(tx)
        .into_matched()
}
