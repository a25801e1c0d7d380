pub mod extractor;
pub mod matcher;
pub mod scanner;

pub use extractor::extract_balance_changes;
pub use matcher::{MatchCriteria, MatchOutcome, SkipReason, TransferMatcher, match_transfer};
pub use scanner::{NoProgress, ScanProgress, ScanReport, SkipStats, TransactionScanner};
