//! Logging for the scanner.
//!
//! Components never reach for a global logger. They receive an
//! `Arc<dyn Logger>` and default to [`NoopLogger`], so a scan behaves the same
//! whether or not anything is listening. [`TracingLogger`] forwards events to
//! `tracing`; [`init_logging`] installs the console and file layers that
//! render them.

use colored::Colorize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt as tracing_fmt};

use crate::common::error::{Result, ScannerError};

/// Environment variable that mutes console output.
pub const SILENT_ENV: &str = "SOL_SCANNER_SILENT";

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "solana_scanner.log";

/// `tracing` target of every scanner event.
pub const LOG_TARGET: &str = "solana_amount_scanner";

const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Severity of a log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    /// Upper-case tag used in plain-text output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// The `tracing` level an event is emitted at. `Success` is an info
    /// event tagged `success = true`.
    #[must_use]
    pub fn tracing_level(self) -> Level {
        match self {
            Self::Debug => Level::DEBUG,
            Self::Info | Self::Success => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A destination for scanner log events.
pub trait Logger: Send + Sync {
    /// Records one event. Implementations must not panic or block for long.
    fn log(&self, level: LogLevel, message: &str);

    /// Whether events at `level` would be recorded at all.
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }

    fn debug(&self, message: &str) {
        if self.enabled(LogLevel::Debug) {
            self.log(LogLevel::Debug, message);
        }
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn success(&self, message: &str) {
        self.log(LogLevel::Success, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}

    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

/// Shared no-op logger, the default for every component.
#[must_use]
pub fn noop() -> Arc<dyn Logger> {
    Arc::new(NoopLogger)
}

/// Emits every event through `tracing` under [`LOG_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: LOG_TARGET, "{message}"),
            LogLevel::Info => tracing::info!(target: LOG_TARGET, "{message}"),
            LogLevel::Success => tracing::info!(target: LOG_TARGET, success = true, "{message}"),
            LogLevel::Warning => tracing::warn!(target: LOG_TARGET, "{message}"),
            LogLevel::Error => tracing::error!(target: LOG_TARGET, "{message}"),
        }
    }

    fn enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Debug => tracing::enabled!(target: LOG_TARGET, Level::DEBUG),
            LogLevel::Info | LogLevel::Success => tracing::enabled!(target: LOG_TARGET, Level::INFO),
            LogLevel::Warning => tracing::enabled!(target: LOG_TARGET, Level::WARN),
            LogLevel::Error => tracing::enabled!(target: LOG_TARGET, Level::ERROR),
        }
    }
}

/// Shared logger backed by `tracing`.
#[must_use]
pub fn tracing_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

/// Where log output goes.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum console level; `None` keeps the console quiet.
    pub console: Option<LevelFilter>,
    pub file: Option<LogFileConfig>,
}

/// Log file output. Lines are appended as
/// `2024-01-31 12:00:00,123  INFO message`.
#[derive(Debug, Clone)]
pub struct LogFileConfig {
    pub path: PathBuf,
    pub level: LevelFilter,
}

impl LoggingConfig {
    /// File logging at info (debug in debug mode); console logging only in
    /// debug mode.
    #[must_use]
    pub fn for_run(debug: bool, log_file: impl Into<PathBuf>) -> Self {
        let level = if debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };
        Self {
            console: debug.then_some(LevelFilter::DEBUG),
            file: Some(LogFileConfig {
                path: log_file.into(),
                level,
            }),
        }
    }
}

/// Keeps the file writer alive; dropping it flushes buffered lines.
#[derive(Debug)]
pub struct LoggingGuard {
    _worker_guard: Option<WorkerGuard>,
}

/// Builds the subscriber for `config` without installing it.
///
/// The console layer is skipped when [`SILENT_ENV`] is set.
///
/// # Errors
///
/// Returns `ConfigError` when the log file cannot be opened.
pub fn build_subscriber(
    config: &LoggingConfig,
) -> Result<(impl tracing::Subscriber + Send + Sync + 'static, LoggingGuard)> {
    let (file_layer, guard) = match &config.file {
        Some(file) => {
            let (writer, guard) = file_writer(&file.path)?;
            let layer = tracing_fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_timer(ChronoLocal::new(FILE_TIMESTAMP_FORMAT.to_string()))
                .with_filter(file.level);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = config.console.filter(|_| !is_silent()).map(|level| {
        tracing_fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .with_filter(level)
    });

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer);

    Ok((
        subscriber,
        LoggingGuard {
            _worker_guard: guard,
        },
    ))
}

/// Installs the global subscriber for `config`.
///
/// Keep the returned guard alive until the program exits.
///
/// # Errors
///
/// Returns `ConfigError` when the log file cannot be opened and
/// `InternalError` when a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard> {
    let (subscriber, guard) = build_subscriber(config)?;
    subscriber
        .try_init()
        .map_err(|e| ScannerError::InternalError(format!("logging already initialized: {e}")))?;
    Ok(guard)
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| {
            ScannerError::ConfigError(format!("log file {} has no file name", path.display()))
        })?
        .to_string_lossy()
        .into_owned();
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(|e| {
            ScannerError::ConfigError(format!("cannot open log file {}: {e}", path.display()))
        })?;

    Ok(tracing_appender::non_blocking(appender))
}

/// Prints a section banner on stdout unless the console is muted.
pub fn log_section(title: &str) {
    if is_silent() {
        return;
    }
    let rule = "-".repeat(title.len());
    println!("\n{}", title.bold().cyan());
    println!("{}", rule.cyan());
}

fn is_silent() -> bool {
    std::env::var(SILENT_ENV).is_ok_and(|value| !value.is_empty() && value != "0")
}
