//! Line-oriented prompts for the interactive binary.

use std::io::{BufRead, Write};

use crate::common::error::{Result, ScannerError};
use crate::config::{DEFAULT_BLOCK_LIMIT, DEFAULT_MIN_AMOUNT, DEFAULT_TOLERANCE};

/// Asks questions on `output` and reads answers from `input`.
///
/// An empty answer (or end of input) selects the default.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self, question: &str) -> Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Yes/no question; any answer starting with `y` means yes.
    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let answer = self.read_answer(question)?;
        if answer.is_empty() {
            return Ok(default);
        }
        Ok(answer.to_lowercase().starts_with('y'))
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for unparsable text or a missing required value.
    pub fn ask_f64(&mut self, question: &str, default: Option<f64>) -> Result<f64> {
        self.ask_parsed(question, default)
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for unparsable text or a missing required value.
    pub fn ask_u64(&mut self, question: &str, default: Option<u64>) -> Result<u64> {
        self.ask_parsed(question, default)
    }

    /// Free-text question; blank answers are `None`.
    pub fn ask_optional(&mut self, question: &str) -> Result<Option<String>> {
        let answer = self.read_answer(question)?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    fn ask_parsed<T: std::str::FromStr>(&mut self, question: &str, default: Option<T>) -> Result<T> {
        let answer = self.read_answer(question)?;
        if answer.is_empty() {
            return default
                .ok_or_else(|| ScannerError::InvalidInput("a value is required".to_string()));
        }
        answer
            .parse()
            .map_err(|_| ScannerError::InvalidInput(format!("could not parse '{answer}'")))
    }
}

/// Everything the user is asked before a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub debug: bool,
    pub min_amount: f64,
    /// `None` selects the configured or a public endpoint.
    pub rpc_url: Option<String>,
    pub target_amount: f64,
    pub tolerance: f64,
    pub block_limit: u64,
}

/// Runs the question sequence and validates the answers.
///
/// `min_amount_default` seeds the minimum-amount question, typically from
/// the environment.
///
/// # Errors
///
/// Returns `InvalidInput` when an answer does not parse or breaks its
/// constraint: minimum amount and target must be positive, tolerance must not
/// be negative.
pub fn collect_scan_request<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    min_amount_default: Option<f64>,
) -> Result<ScanRequest> {
    let debug = prompter.confirm("Enable debug mode? (y/n, default: n): ", false)?;

    let default_min = min_amount_default.unwrap_or(DEFAULT_MIN_AMOUNT);
    let min_amount = prompter.ask_f64(
        &format!("Enter minimum transaction amount to consider in SOL (default {default_min}): "),
        Some(default_min),
    )?;
    if !(min_amount.is_finite() && min_amount > 0.0) {
        return Err(ScannerError::InvalidInput(
            "Minimum amount must be positive".to_string(),
        ));
    }

    let rpc_url =
        prompter.ask_optional("Enter custom RPC URL (or press Enter to use the default): ")?;

    let target_amount = prompter.ask_f64("Enter the amount in SOL to search for: ", None)?;
    if !(target_amount.is_finite() && target_amount > 0.0) {
        return Err(ScannerError::InvalidInput(
            "Amount must be positive".to_string(),
        ));
    }

    let tolerance = prompter.ask_f64(
        &format!("Enter amount tolerance in SOL (default {DEFAULT_TOLERANCE}): "),
        Some(DEFAULT_TOLERANCE),
    )?;
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        return Err(ScannerError::InvalidInput(
            "Tolerance must not be negative".to_string(),
        ));
    }

    let block_limit = prompter.ask_u64(
        &format!("Enter number of recent blocks to scan (default {DEFAULT_BLOCK_LIMIT}): "),
        Some(DEFAULT_BLOCK_LIMIT),
    )?;

    Ok(ScanRequest {
        debug,
        min_amount,
        rpc_url,
        target_amount,
        tolerance,
        block_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(answers: &str) -> Result<ScanRequest> {
        let mut output = Vec::new();
        let mut prompter = Prompter::new(Cursor::new(answers.as_bytes()), &mut output);
        collect_scan_request(&mut prompter, None)
    }

    #[test]
    fn test_defaults_apply_to_blank_answers() {
        let request = collect("\n\n\n2.5\n\n\n").unwrap();

        assert_eq!(
            request,
            ScanRequest {
                debug: false,
                min_amount: 0.001,
                rpc_url: None,
                target_amount: 2.5,
                tolerance: 0.1,
                block_limit: 100,
            }
        );
    }

    #[test]
    fn test_explicit_answers() {
        let request = collect("Yes\n0.01\nhttps://rpc.example.com\n10\n0\n25\n").unwrap();

        assert!(request.debug);
        assert_eq!(request.min_amount, 0.01);
        assert_eq!(request.rpc_url.as_deref(), Some("https://rpc.example.com"));
        assert_eq!(request.target_amount, 10.0);
        assert_eq!(request.tolerance, 0.0);
        assert_eq!(request.block_limit, 25);
    }

    #[test]
    fn test_constraint_violations() {
        assert!(matches!(
            collect("n\n0\n"),
            Err(ScannerError::InvalidInput(msg)) if msg == "Minimum amount must be positive"
        ));
        assert!(matches!(
            collect("n\n\n\n-3\n"),
            Err(ScannerError::InvalidInput(msg)) if msg == "Amount must be positive"
        ));
        assert!(matches!(
            collect("n\n\n\n1\n-0.1\n"),
            Err(ScannerError::InvalidInput(msg)) if msg == "Tolerance must not be negative"
        ));
    }

    #[test]
    fn test_target_is_required() {
        assert!(collect("n\n\n\n\n").is_err());
        assert!(collect("n\n\n\nabc\n").is_err());
    }

    #[test]
    fn test_env_default_for_min_amount() {
        let mut output = Vec::new();
        let mut prompter = Prompter::new(Cursor::new(b"\n\n\n1\n\n\n".as_slice()), &mut output);
        let request = collect_scan_request(&mut prompter, Some(0.05)).unwrap();

        assert_eq!(request.min_amount, 0.05);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("(default 0.05)"));
    }
}
