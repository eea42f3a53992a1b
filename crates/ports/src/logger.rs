//! Structured logging boundary contract.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

impl LogLevel {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Parse a level name (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Additional event fields.
pub type LogFields = BTreeMap<Box<str>, Value>;

/// Build [`LogFields`] from `(key, value)` pairs.
pub fn log_fields<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> LogFields
where
    K: Into<Box<str>>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Stable event name (`keos.validate.*`).
    pub event: Box<str>,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message (safe, redacted).
    pub message: Box<str>,
    /// Optional structured fields.
    pub fields: Option<LogFields>,
    /// Optional error payload.
    pub error: Option<Value>,
}

impl LogEvent {
    /// Event without fields or error payload.
    pub fn new(level: LogLevel, event: &str, message: &str) -> Self {
        Self {
            event: event.into(),
            level,
            message: message.into(),
            fields: None,
            error: None,
        }
    }
}

/// Boundary contract for structured logging.
pub trait LoggerPort: Send + Sync {
    /// Emit a structured event.
    fn log(&self, event: LogEvent);

    /// Create a child logger with base fields applied to every event.
    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort>;

    /// Convenience: debug event.
    fn debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(LogLevel::Debug, event, message)
        });
    }

    /// Convenience: info event.
    fn info(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(LogLevel::Info, event, message)
        });
    }

    /// Convenience: warn event.
    fn warn(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(LogLevel::Warn, event, message)
        });
    }

    /// Convenience: error event with an optional error payload.
    fn error(&self, event: &str, message: &str, fields: Option<LogFields>, error: Option<Value>) {
        self.log(LogEvent {
            fields,
            error,
            ..LogEvent::new(LogLevel::Error, event, message)
        });
    }
}
