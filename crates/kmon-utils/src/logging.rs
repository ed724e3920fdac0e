//! # Logging Utilities
//!
//! Logging infrastructure for kmon using `tracing`.
//!
//! The monitor owns stdout for its prompt and command output, so console logs
//! always go to stderr. Supported:
//! - Pretty or JSON output
//! - Level filtering through `RUST_LOG` or an explicit level
//! - An optional daily-rolling log file
//! - File-only logging for interactive sessions that want a clean terminal
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kmon_utils::{init_logging, LogConfig};
//!
//! // Keep the guard alive for as long as logs should be flushed to file
//! let _guard = init_logging(&LogConfig::from_env()).expect("Failed to initialize logging");
//!
//! tracing::info!("Monitor starting");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=kmon_core=debug`)
//! - `KMON_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `KMON_LOG_FILE`: Optional path of a log file, rolled daily

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, fmt, io};

use chrono::Local;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self as tracing_fmt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const FORMAT_ENV: &str = "KMON_LOG_FORMAT";

/// Environment variable naming a log file.
pub const FILE_ENV: &str = "KMON_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level, one event per walked frame and dispatched command
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::Display::fmt(&Level::from(*self), f)
    }
}

/// Where and how to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig
{
    /// Explicit level. Takes precedence over `RUST_LOG` when set.
    pub level: Option<LogLevel>,
    pub format: LogFormat,
    /// Log file, rolled daily.
    pub file: Option<PathBuf>,
    /// Also log to stderr.
    pub console: bool,
}

impl Default for LogConfig
{
    fn default() -> Self
    {
        Self {
            level: None,
            format: LogFormat::Pretty,
            file: None,
            console: true,
        }
    }
}

impl LogConfig
{
    /// Read `KMON_LOG_FORMAT` and `KMON_LOG_FILE`.
    ///
    /// An unparsable format falls back to pretty. `RUST_LOG` is consulted
    /// later, when the filter is built.
    pub fn from_env() -> Self
    {
        let format = env::var(FORMAT_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let file = env::var_os(FILE_ENV).filter(|s| !s.is_empty()).map(PathBuf::from);

        Self {
            format,
            file,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: Option<LogLevel>) -> Self
    {
        if level.is_some() {
            self.level = level;
        }
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self
    {
        self.format = format;
        self
    }

    /// Log only to a file, keeping the terminal for the monitor.
    ///
    /// Uses the configured file if there is one, otherwise [`default_log_file`].
    #[must_use]
    pub fn file_only(mut self) -> Self
    {
        if self.file.is_none() {
            self.file = Some(default_log_file());
        }
        self.console = false;
        self
    }

    /// Filter priority: explicit level, then `RUST_LOG`, then `info`.
    fn filter(&self) -> EnvFilter
    {
        if let Some(level) = self.level {
            return EnvFilter::new(Level::from(level).to_string());
        }
        match env::var("RUST_LOG") {
            Ok(rust_log) => EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
            Err(_) => EnvFilter::new(Level::INFO.to_string()),
        }
    }
}

/// Keeps the background file writer alive.
///
/// Dropping it flushes and stops file logging, so hold it until exit.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingGuard
{
    file: Option<WorkerGuard>,
    path: Option<PathBuf>,
}

impl LoggingGuard
{
    /// Path of the log file, when logging to one.
    pub fn log_file(&self) -> Option<&Path>
    {
        self.path.as_deref()
    }

    pub fn is_logging_to_file(&self) -> bool
    {
        self.file.is_some()
    }
}

/// `~/.kmon/YYYY-MM-DD-kmon.log`, or the same name under the temp directory
/// when `HOME` is unset.
pub fn default_log_file() -> PathBuf
{
    let today = Local::now().format("%Y-%m-%d");
    let dir = env::var_os("HOME").map_or_else(env::temp_dir, |home| PathBuf::from(home).join(".kmon"));
    dir.join(format!("{today}-kmon.log"))
}

/// Initialize logging from environment variables alone.
///
/// ## Errors
///
/// See [`init_logging`].
pub fn init_logging_from_env() -> Result<LoggingGuard, LoggingError>
{
    init_logging(&LogConfig::from_env())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber described by `config`.
///
/// ## Errors
///
/// Returns an error if:
/// - A global subscriber is already installed
/// - The log file's directory cannot be created
pub fn init_logging(config: &LogConfig) -> Result<LoggingGuard, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = LoggingGuard::default();

    if config.console {
        layers.push(console_layer(config.format, config.filter()));
    }

    if let Some(path) = &config.file {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let name = path
            .file_name()
            .ok_or_else(|| LoggingError::InvalidFile(path.clone()))?;

        let (writer, worker) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, name));
        layers.push(file_layer(config.format, config.filter(), writer));
        guard.file = Some(worker);
        guard.path = Some(path.clone());
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(guard)
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    let layer = tracing_fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);

    match format {
        LogFormat::Pretty => layer.with_ansi(true).with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, filter: EnvFilter, writer: tracing_appender::non_blocking::NonBlocking) -> BoxedLayer
{
    let layer = tracing_fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false) // No ANSI in files
        .with_writer(writer);

    match format {
        LogFormat::Pretty => layer.with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// Log file path has no file name
    #[error("Invalid log file: {}", .0.display())]
    InvalidFile(PathBuf),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
