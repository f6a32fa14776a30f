//! # Ctl Core Logging
//!
//! The application logger resolved from the container under `log`.
//!
//! [`LogManager`] filters records by the configured level and forwards them
//! to a [`Logger`] sink. The default sink is the `log` facade, so whichever
//! backend the binary installs (see the `core-logging` provider) receives
//! framework records as well.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{Level, LevelFilter};
use parking_lot::Mutex;
use serde_json::Value;

use crate::kernel::error::{Error, Result};
use crate::storage::ConfigRepository;

/// Structured context attached to a log record.
pub type LogContext = BTreeMap<String, Value>;

/// Sink accepting `(level, message, context)` records.
pub trait Logger: Send + Sync + fmt::Debug {
    fn log(&self, level: Level, message: &str, context: &LogContext);
}

/// Output format requested for the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::Configuration(format!("unknown log format '{}'", other))),
        }
    }
}

/// Settings read from the `logging` configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub channel: String,
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            channel: crate::kernel::constants::APP_NAME.to_string(),
            level: LevelFilter::Info,
            format: LogFormat::Text,
        }
    }
}

impl LogSettings {
    /// Read `logging.channel`, `logging.level` and `logging.format`.
    pub fn from_config(config: &ConfigRepository) -> Result<Self> {
        let defaults = Self::default();

        let level = match config.get::<String>("logging.level") {
            Some(level) => LevelFilter::from_str(&level)
                .map_err(|_| Error::Configuration(format!("invalid log level '{}'", level)))?,
            None => defaults.level,
        };
        let format = match config.get::<String>("logging.format") {
            Some(format) => format.parse()?,
            None => defaults.format,
        };

        Ok(Self {
            channel: config.get_or("logging.channel", defaults.channel),
            level,
            format,
        })
    }
}

/// Forwards records to the `log` facade under the channel name as target.
#[derive(Debug, Clone)]
pub struct FacadeLogger {
    target: String,
}

impl FacadeLogger {
    pub fn new(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }
}

impl Logger for FacadeLogger {
    fn log(&self, level: Level, message: &str, context: &LogContext) {
        if context.is_empty() {
            log::log!(target: &self.target, level, "{}", message);
        } else {
            let context = serde_json::to_string(context).unwrap_or_default();
            log::log!(target: &self.target, level, "{} {}", message, context);
        }
    }
}

/// A record captured by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub context: LogContext,
}

/// Sink that keeps records in memory; used by tests.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str, context: &LogContext) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            context: context.clone(),
        });
    }
}

/// Application logger service.
pub struct LogManager {
    settings: LogSettings,
    sink: Arc<dyn Logger>,
}

impl LogManager {
    /// Logger writing to the `log` facade.
    pub fn new(settings: LogSettings) -> Self {
        let sink = Arc::new(FacadeLogger::new(settings.channel.clone()));
        Self { settings, sink }
    }

    /// Logger writing to a custom sink.
    pub fn with_sink(settings: LogSettings, sink: Arc<dyn Logger>) -> Self {
        Self { settings, sink }
    }

    pub fn settings(&self) -> &LogSettings {
        &self.settings
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.settings.level
    }

    pub fn log(&self, level: Level, message: &str, context: &LogContext) {
        if self.enabled(level) {
            self.sink.log(level, message, context);
        }
    }

    pub fn error(&self, message: &str, context: &LogContext) {
        self.log(Level::Error, message, context);
    }

    pub fn warning(&self, message: &str, context: &LogContext) {
        self.log(Level::Warn, message, context);
    }

    pub fn info(&self, message: &str, context: &LogContext) {
        self.log(Level::Info, message, context);
    }

    pub fn debug(&self, message: &str, context: &LogContext) {
        self.log(Level::Debug, message, context);
    }
}

impl fmt::Debug for LogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogManager")
            .field("settings", &self.settings)
            .field("sink", &self.sink)
            .finish()
    }
}
