//! `LoggerPort` adapter forwarding events to the `tracing` facade.

use keos_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use keos_shared::{REDACTED, is_secret_key};
use serde_json::Value;

/// Logger that re-emits every event through `tracing` under the `keos` target.
///
/// Fields and error payloads are rendered as JSON strings; secret-looking
/// field keys are redacted first.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger {
    base_fields: LogFields,
}

impl TracingLogger {
    /// Logger without base fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoggerPort for TracingLogger {
    fn log(&self, event: LogEvent) {
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields.unwrap_or_default());
        let fields = render_fields(&fields);
        let error = event.error.map(|error| error.to_string()).unwrap_or_default();
        let name = &*event.event;
        let message = &*event.message;

        match event.level {
            LogLevel::Debug => {
                tracing::debug!(target: "keos", event = name, fields = %fields, error = %error, "{message}");
            },
            LogLevel::Info => {
                tracing::info!(target: "keos", event = name, fields = %fields, error = %error, "{message}");
            },
            LogLevel::Warn => {
                tracing::warn!(target: "keos", event = name, fields = %fields, error = %error, "{message}");
            },
            LogLevel::Error => {
                tracing::error!(target: "keos", event = name, fields = %fields, error = %error, "{message}");
            },
        }
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            base_fields: merged,
        })
    }
}

fn render_fields(fields: &LogFields) -> String {
    let map: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(key, value)| {
            let value = if is_secret_key(key) {
                Value::from(REDACTED)
            } else {
                value.clone()
            };
            (key.to_string(), value)
        })
        .collect();
    Value::Object(map).to_string()
}
