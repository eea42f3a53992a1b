//! Structured JSON logger adapter.

use crate::log_sink::LogSink;
use keos_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use keos_shared::{REDACTED, is_secret_key};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const SERIALIZE_FAILED_LINE: &str = "{\"timestampMs\":0,\"level\":\"error\",\"event\":\"logger.serialize_failed\",\"message\":\"log serialization failed\"}\n";

/// JSON logger emitting one line per event.
#[derive(Clone)]
pub struct JsonLogger {
    sink: Arc<dyn LogSink>,
    base_fields: LogFields,
    min_level: LogLevel,
}

impl JsonLogger {
    /// Create a JSON logger backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_fields: LogFields::new(),
            min_level: LogLevel::Info,
        }
    }

    /// Set base fields applied to every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Set the minimum log level.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn render(&self, event: LogEvent) -> String {
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields.unwrap_or_default());
        redact_fields(&mut fields);

        let mut payload = serde_json::Map::new();
        payload.insert("timestampMs".to_string(), Value::from(now_epoch_ms()));
        payload.insert("level".to_string(), Value::from(event.level.as_str()));
        payload.insert("event".to_string(), Value::from(&*event.event));
        payload.insert("message".to_string(), Value::from(&*event.message));
        if !fields.is_empty() {
            let fields = fields
                .into_iter()
                .map(|(key, value)| (key.into_string(), value))
                .collect();
            payload.insert("fields".to_string(), Value::Object(fields));
        }
        if let Some(mut error) = event.error {
            redact_value(&mut error);
            payload.insert("error".to_string(), error);
        }

        serde_json::to_string(&Value::Object(payload)).map_or_else(
            |_| SERIALIZE_FAILED_LINE.to_string(),
            |mut encoded| {
                encoded.push('\n');
                encoded
            },
        )
    }
}

impl LoggerPort for JsonLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }
        let line = self.render(event);
        self.sink.write_line(&line);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            sink: Arc::clone(&self.sink),
            base_fields: merged,
            min_level: self.min_level,
        })
    }
}

fn redact_fields(fields: &mut LogFields) {
    for (key, value) in fields.iter_mut() {
        if is_secret_key(key) {
            *value = Value::from(REDACTED);
        } else {
            redact_value(value);
        }
    }
}

fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_secret_key(key) {
                    *nested = Value::from(REDACTED);
                } else {
                    redact_value(nested);
                }
            }
        },
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {},
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::BufferLogSink;
    use keos_ports::log_fields;
    use serde_json::json;
    use std::error::Error;

    fn single_line(sink: &BufferLogSink) -> Result<Value, Box<dyn Error>> {
        let lines = sink.take();
        let [line] = lines.as_slice() else {
            return Err(format!("expected one line, got {}", lines.len()).into());
        };
        Ok(serde_json::from_str(line.trim())?)
    }

    #[test]
    fn credential_fields_are_redacted() -> Result<(), Box<dyn Error>> {
        let sink = Arc::new(BufferLogSink::new());
        let logger = JsonLogger::new(sink.clone());

        logger.log(LogEvent {
            fields: Some(log_fields([
                ("secret_key", json!("fixture-secret-key")),
                ("provider", json!("aws")),
            ])),
            error: Some(json!({
                "client_secret": "hide-me",
                "nested": { "pass": "nope", "attempt": 1 }
            })),
            ..LogEvent::new(LogLevel::Error, "keos.validate.failed", "validation failed")
        });

        let payload = single_line(&sink)?;
        assert_eq!(payload.pointer("/fields/secret_key"), Some(&json!(REDACTED)));
        assert_eq!(payload.pointer("/fields/provider"), Some(&json!("aws")));
        assert_eq!(payload.pointer("/error/client_secret"), Some(&json!(REDACTED)));
        assert_eq!(payload.pointer("/error/nested/attempt"), Some(&json!(1)));
        assert_eq!(payload.get("level"), Some(&json!("error")));
        Ok(())
    }

    #[test]
    fn events_below_min_level_are_dropped() {
        let sink = Arc::new(BufferLogSink::new());
        let logger = JsonLogger::new(sink.clone()).with_min_level(LogLevel::Warn);

        logger.debug("keos.validate.start", "starting", None);
        logger.info("keos.validate.completed", "done", None);
        assert!(sink.take().is_empty());

        logger.warn("keos.validate.slow", "slow lookup", None);
        assert_eq!(sink.take().len(), 1);
    }

    #[test]
    fn child_logger_merges_fields() -> Result<(), Box<dyn Error>> {
        let sink = Arc::new(BufferLogSink::new());
        let logger = JsonLogger::new(sink.clone())
            .with_base_fields(log_fields([("validator", "aws-managed")]));

        let child = logger.child(log_fields([("provider", "aws")]));
        child.info("keos.validate.start", "starting", None);

        let payload = single_line(&sink)?;
        assert_eq!(payload.pointer("/fields/validator"), Some(&json!("aws-managed")));
        assert_eq!(payload.pointer("/fields/provider"), Some(&json!("aws")));
        assert_eq!(payload.get("event"), Some(&json!("keos.validate.start")));
        Ok(())
    }
}
