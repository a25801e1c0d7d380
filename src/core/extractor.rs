//! Per-account balance deltas of a transaction.

use crate::types::{BalanceChange, BalanceChanges};

/// Computes the balance change of every account whose |change| reaches
/// `min_threshold` (inclusive).
///
/// The three slices are index-aligned; indices past the shortest one are
/// ignored.
#[must_use]
pub fn extract_balance_changes<K: AsRef<str>>(
    pre_balances: &[u64],
    post_balances: &[u64],
    account_keys: &[K],
    min_threshold: f64,
) -> BalanceChanges {
    let mut changes = BalanceChanges::new();

    for ((pre, post), account) in pre_balances
        .iter()
        .zip(post_balances)
        .zip(account_keys)
    {
        let change = BalanceChange::from_lamports(*pre, *post);
        if change.magnitude() >= min_threshold {
            changes.insert(account.as_ref(), change);
        }
    }

    changes
}
