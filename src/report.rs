//! Console rendering of scan results.

use chrono::DateTime;
use colored::Colorize;
use solana_sdk::clock::{Slot, UnixTimestamp};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

use crate::common::error::Result;
use crate::core::{ScanProgress, ScanReport};
use crate::types::ScanMatch;

/// What was searched for, echoed in the report.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext {
    pub target_amount: f64,
    pub tolerance: f64,
    pub block_limit: u64,
    pub elapsed: Duration,
}

/// Formats a block time as `YYYY-mm-dd HH:MM:SS UTC`.
#[must_use]
pub fn format_block_time(block_time: UnixTimestamp) -> String {
    match DateTime::from_timestamp(block_time, 0) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => block_time.to_string(),
    }
}

/// Writes the human-readable report.
pub fn render_text<W: Write>(
    out: &mut W,
    matches: &[ScanMatch],
    context: &ReportContext,
) -> io::Result<()> {
    if matches.is_empty() {
        writeln!(
            out,
            "\nNo transactions found with {} ±{} SOL in the last {} blocks.",
            context.target_amount, context.tolerance, context.block_limit
        )?;
    } else {
        let heading = format!(
            "Found {} transactions matching {} ±{} SOL:",
            matches.len(),
            context.target_amount,
            context.tolerance
        );
        writeln!(out, "\n{}", heading.green().bold())?;
        for scan_match in matches {
            render_match(out, scan_match)?;
        }
    }

    writeln!(
        out,
        "\nScan completed in {:.2} seconds",
        context.elapsed.as_secs_f64()
    )
}

fn render_match<W: Write>(out: &mut W, scan_match: &ScanMatch) -> io::Result<()> {
    writeln!(out, "\n{}", "Transaction Details:".bold())?;
    writeln!(out, "Hash: {}", scan_match.tx_hash)?;
    writeln!(out, "Amount: {:.9} SOL", scan_match.amount)?;
    writeln!(out, "Block Height: {}", scan_match.slot)?;
    writeln!(out, "Time: {}", format_block_time(scan_match.block_time))?;

    if let Some(sender) = &scan_match.sender {
        writeln!(out, "Sender: {sender}")?;
    }
    if let Some(receiver) = &scan_match.receiver {
        writeln!(out, "Receiver: {receiver}")?;
    }
    writeln!(out, "Transaction Fee: {:.6} SOL", scan_match.fee)?;

    if !scan_match.balance_changes.is_empty() {
        writeln!(out, "\nDetailed Balance Changes:")?;
        for (account, change) in scan_match.balance_changes.iter() {
            writeln!(out, "\nAccount: {account}")?;
            writeln!(out, "  Pre-balance:  {:.9} SOL", change.pre_balance)?;
            writeln!(out, "  Post-balance: {:.9} SOL", change.post_balance)?;
            writeln!(out, "  Net change:   {:.9} SOL", change.change)?;
        }
    }

    writeln!(out, "{}", "-".repeat(50))
}

/// Writes the matches as a pretty-printed JSON array.
///
/// # Errors
///
/// Fails when the writer fails.
pub fn render_json<W: Write>(out: &mut W, matches: &[ScanMatch]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, matches)?;
    writeln!(out)?;
    Ok(())
}

/// Single-line progress counter on stdout.
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    started: Mutex<bool>,
}

impl ScanProgress for ConsoleProgress {
    fn on_block(&self, index: usize, total: usize, _slot: Slot) {
        if let Ok(mut started) = self.started.lock() {
            *started = true;
        }
        print!("\rProgress: {index}/{total} blocks scanned...");
        let _ = io::stdout().flush();
    }

    fn on_complete(&self, _report: &ScanReport) {
        if self.started.lock().is_ok_and(|started| *started) {
            println!();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BalanceChange, BalanceChanges, MatchedTransfer};

    fn sample() -> ScanMatch {
        let mut balance_changes = BalanceChanges::new();
        balance_changes.insert(
            "Sender111",
            BalanceChange::from_lamports(10_000_000_000, 4_999_995_000),
        );
        balance_changes.insert("Receiver222", BalanceChange::from_lamports(0, 5_000_000_000));

        ScanMatch::new(
            "5j7s6NiJS3JAkvgkoc18WVAsiSaci2pxB2A6ueCJP4tprA2TFg9wSyTLeYouxPBJEMzJinENTkpA52YStRW5Dia7",
            250_000_123,
            1_700_000_000,
            MatchedTransfer {
                amount: 5.000005,
                sender: Some("Sender111".to_string()),
                receiver: Some("Receiver222".to_string()),
                fee: 0.000005,
                balance_changes,
            },
        )
    }

    fn context() -> ReportContext {
        ReportContext {
            target_amount: 5.0,
            tolerance: 0.1,
            block_limit: 100,
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_format_block_time() {
        assert_eq!(format_block_time(0), "1970-01-01 00:00:00 UTC");
        assert_eq!(format_block_time(1_700_000_000), "2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_render_text_with_match() {
        let mut out = Vec::new();
        render_text(&mut out, &[sample()], &context()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Hash: 5j7s6NiJS3JAkvgkoc18WVAsiSaci2pxB2A6ueCJP4tprA2TFg9wSyTLeYouxPBJEMzJinENTkpA52YStRW5Dia7"));
        assert!(text.contains("Amount: 5.000005000 SOL"));
        assert!(text.contains("Block Height: 250000123"));
        assert!(text.contains("Time: 2023-11-14 22:13:20 UTC"));
        assert!(text.contains("Sender: Sender111"));
        assert!(text.contains("Receiver: Receiver222"));
        assert!(text.contains("Transaction Fee: 0.000005 SOL"));
        assert!(text.contains("  Pre-balance:  10.000000000 SOL"));
        assert!(text.contains("  Net change:   -5.000005000 SOL"));
        assert!(text.contains("Scan completed in 1.50 seconds"));
    }

    #[test]
    fn test_render_text_without_matches() {
        let mut out = Vec::new();
        render_text(&mut out, &[], &context()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("No transactions found with 5 ±0.1 SOL in the last 100 blocks."));
    }

    #[test]
    fn test_render_json() {
        let mut out = Vec::new();
        render_json(&mut out, &[sample()]).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["slot"], 250_000_123);
        assert_eq!(parsed[0]["sender"], "Sender111");
        assert_eq!(parsed[0]["balance_changes"]["Receiver222"]["change"], 5.0);
    }
}
