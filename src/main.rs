//! Interactive amount scanner.
//!
//! Asks for the search parameters, scans the most recent finalized blocks and
//! prints every matching transfer. Defaults can be preset in `.env`
//! (`RPC_URL`, `SCANNER_MIN_AMOUNT`, `SCANNER_LOG_FILE`, ...); set
//! `SCANNER_OUTPUT=json` for machine-readable output.

#![warn(clippy::all, clippy::pedantic)]

use solana_amount_scanner::logging::{
    DEFAULT_LOG_FILE, LoggingConfig, LoggingGuard, init_logging, log_section, tracing_logger,
};
use solana_amount_scanner::prompt::{Prompter, collect_scan_request};
use solana_amount_scanner::report::{ConsoleProgress, ReportContext, render_json, render_text};
use solana_amount_scanner::{Logger, ScannerConfigBuilder, ScannerError, TransactionScanner};
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Instant;

fn invalid_input(err: &ScannerError) -> ! {
    match err {
        ScannerError::InvalidInput(msg) | ScannerError::ConfigError(msg) => {
            println!("Invalid input: {msg}");
        }
        other => println!("Invalid input: {other}"),
    }
    process::exit(1);
}

fn start_logging(log_file: PathBuf, debug: bool) -> Option<LoggingGuard> {
    match init_logging(&LoggingConfig::for_run(debug, log_file)) {
        Ok(guard) => {
            if debug {
                println!("Debug mode enabled - detailed output will be shown");
            }
            Some(guard)
        }
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file, if any
    dotenvy::dotenv().ok();

    log_section("Solana Transaction Scanner");

    let builder = ScannerConfigBuilder::from_env().unwrap_or_else(|e| invalid_input(&e));
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
    let request = match collect_scan_request(&mut prompter, Some(builder.min_amount())) {
        Ok(request) => request,
        Err(e @ ScannerError::InvalidInput(_)) => invalid_input(&e),
        Err(e) => return Err(e.into()),
    };

    let mut builder = builder
        .with_min_amount(request.min_amount)
        .with_debug(request.debug);
    if let Some(url) = &request.rpc_url {
        builder = builder.with_rpc(url);
    }
    let config = builder.build().unwrap_or_else(|e| invalid_input(&e));

    let log_file = config
        .log_file
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILE.into());
    let log_guard = start_logging(log_file, config.debug);
    let logger = tracing_logger();

    let min_amount = config.min_amount_threshold;
    let scanner = TransactionScanner::new(config, logger.clone())
        .with_progress(Arc::new(ConsoleProgress::default()));

    match scanner.connect().await {
        Some(slot) => println!(
            "\nConnected to RPC endpoint: {} (finalized slot {slot})",
            scanner.rpc_url()
        ),
        None => println!(
            "\nWarning: RPC endpoint {} did not answer getSlot",
            scanner.rpc_url()
        ),
    }
    println!(
        "\nScanning last {} blocks for {} ±{} SOL transactions...",
        request.block_limit, request.target_amount, request.tolerance
    );
    println!("Filtering out transactions smaller than {min_amount} SOL");

    let started = Instant::now();
    let matches = match scanner
        .scan(request.target_amount, request.block_limit, request.tolerance)
        .await
    {
        Ok(matches) => matches,
        Err(e) => {
            logger.error(&format!("Unexpected error: {e}"));
            println!("An error occurred. Check the log file for details.");
            // process::exit skips destructors; flush the log file first.
            drop(log_guard);
            process::exit(1);
        }
    };

    let context = ReportContext {
        target_amount: request.target_amount,
        tolerance: request.tolerance,
        block_limit: request.block_limit,
        elapsed: started.elapsed(),
    };

    let mut stdout = io::stdout().lock();
    if std::env::var("SCANNER_OUTPUT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        render_json(&mut stdout, &matches)?;
    } else {
        render_text(&mut stdout, &matches, &context)?;
    }

    Ok(())
}
