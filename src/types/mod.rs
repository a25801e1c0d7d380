//! Data types flowing through a scan.

pub mod transaction;
pub mod transfer;

pub use transaction::TransactionRecord;
pub use transfer::{
    BalanceChange, BalanceChanges, MatchedTransfer, ScanMatch, lamports_to_sol,
};
