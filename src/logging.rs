/// Structured logging for the channel monitoring service
///
/// Provides context-rich logging with component tags, optional context ids
/// (tick index, alert level), timestamps, and severity levels. Supports both
/// console output and file-based logging for daemon operations.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use crate::model::StoreError;
use crate::simulation::ticker::TickerReport;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Simulation,
    Store,
    Alert,
    Vision,
    Config,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Simulation => write!(f, "SIM"),
            Component::Store => write!(f, "STORE"),
            Component::Alert => write!(f, "ALERT"),
            Component::Vision => write!(f, "VISION"),
            Component::Config => write!(f, "CONFIG"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Backend briefly unreachable; a later write may succeed
    Transient,
    /// Schema or data problem; retrying the same write will fail again
    Fatal,
    /// Cannot tell from the error alone
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Transient => write!(f, "TRANSIENT"),
            FailureType::Fatal => write!(f, "FATAL"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    fn log(&self, level: LogLevel, component: Component, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC");
        let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, component, context_part, message);

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warn => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, context_part, message),
                LogLevel::Warn => eprintln!("   ⚠ {}{}: {}", component, context_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", component, context_part, message),
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger. Calling it again replaces the settings.
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    let logger = Logger {
        min_level,
        log_file: log_file.map(String::from),
        console_timestamps,
    };
    *LOGGER.lock().unwrap_or_else(PoisonError::into_inner) = Some(logger);
}

fn emit(level: LogLevel, component: Component, context: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
        logger.log(level, component, context, message);
    }
}

pub fn info(component: Component, context: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, context, message);
}

pub fn warn(component: Component, context: Option<&str>, message: &str) {
    emit(LogLevel::Warn, component, context, message);
}

pub fn error(component: Component, context: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, context, message);
}

pub fn debug(component: Component, context: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, context, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a store failure from the error variant and its message
pub fn classify_store_failure(err: &StoreError) -> FailureType {
    match err {
        StoreError::Malformed(_) => FailureType::Fatal,
        StoreError::Unavailable(_) => FailureType::Transient,
        StoreError::Io(_) => FailureType::Unknown,
        StoreError::Postgres(e) => {
            let msg = e.to_string();
            if e.is_closed() || msg.contains("connection") || msg.contains("timed out") {
                FailureType::Transient
            } else if msg.contains("does not exist") || msg.contains("violates") {
                FailureType::Fatal
            } else {
                FailureType::Unknown
            }
        }
    }
}

/// Log a store failure with automatic classification
pub fn log_store_failure(operation: &str, err: &StoreError) {
    let failure_type = classify_store_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Transient => warn(Component::Store, None, &message),
        FailureType::Fatal | FailureType::Unknown => error(Component::Store, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a ticker run
pub fn log_run_summary(report: &TickerReport, halted: bool) {
    let message = format!(
        "Simulation stopped after {} ticks: {} samples, {} alerts persisted, {} alerts suppressed",
        report.ticks, report.samples_persisted, report.alerts_persisted, report.alerts_suppressed
    );

    if halted && report.samples_persisted == 0 {
        error(Component::Simulation, None, &message);
    } else if halted {
        warn(Component::Simulation, None, &message);
    } else {
        info(Component::Simulation, None, &message);
    }
}
