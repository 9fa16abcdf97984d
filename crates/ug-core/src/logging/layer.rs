//! Tracing layer that routes events through a [`RedactingLogSink`].
//!
//! The event message and its fields are flattened into one line of
//! `field=value` assignments joined by the redactor's separator. A field
//! the redactor covers is written with the marker in place of its value, so
//! a separator inside that value cannot cut the redaction short. The sink
//! still redacts the whole line, which catches assignments in the message.

use std::sync::Arc;

use chrono::Utc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use ug_redact::FieldRedactor;

use super::sink::{Level, LogRecord, RedactingLogSink};

/// Collects an event's message and fields as text parts.
struct LineVisitor<'a> {
    redactor: &'a FieldRedactor,
    message: Option<String>,
    fields: Vec<String>,
}

impl<'a> LineVisitor<'a> {
    fn new(redactor: &'a FieldRedactor) -> Self {
        LineVisitor {
            redactor,
            message: None,
            fields: Vec::new(),
        }
    }

    fn push(&mut self, field: &Field, value: impl FnOnce() -> String) {
        let name = field.name();
        if name == "message" {
            self.message = Some(value());
        } else if self.redactor.covers(name) {
            self.fields.push(format!("{}={}", name, self.redactor.marker()));
        } else {
            self.fields.push(format!("{}={}", name, value()));
        }
    }

    fn into_line(self) -> String {
        let sep = self.redactor.separator().to_string();
        self.message
            .into_iter()
            .chain(self.fields)
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

impl Visit for LineVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, || value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, || format!("{:?}", value));
    }
}

/// Layer that emits every event through a redacting sink.
#[derive(Debug, Clone)]
pub struct RedactingLayer {
    sink: Arc<RedactingLogSink>,
}

impl RedactingLayer {
    pub fn new(sink: Arc<RedactingLogSink>) -> Self {
        RedactingLayer { sink }
    }

    pub fn sink(&self) -> &RedactingLogSink {
        &self.sink
    }
}

impl<S: Subscriber> Layer<S> for RedactingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::new(self.sink.redactor());
        event.record(&mut visitor);

        let metadata = event.metadata();
        let record = LogRecord {
            level: Level::from(*metadata.level()),
            logger: metadata.target().to_string(),
            timestamp: Utc::now(),
            message: visitor.into_line(),
        };

        // Nowhere to report a failed write from inside a layer.
        let _ = self.sink.emit(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::sink::MemoryEmitter;
    use tracing_subscriber::layer::SubscriberExt;
    use ug_redact::FieldRedactor;

    fn capture(f: impl FnOnce()) -> Vec<String> {
        let emitter = MemoryEmitter::new();
        let sink = RedactingLogSink::new(FieldRedactor::default(), Box::new(emitter.clone()));
        let subscriber = tracing_subscriber::registry().with(RedactingLayer::new(Arc::new(sink)));
        tracing::subscriber::with_default(subscriber, f);
        emitter.lines()
    }

    #[test]
    fn test_message_is_redacted() {
        let lines = capture(|| {
            tracing::info!(target: "user_data", "name=Bob;email=bob@x.com;role=admin");
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[USERGUARD] user_data INFO "));
        assert!(lines[0].ends_with(": name=***;email=***;role=admin"));
    }

    #[test]
    fn test_structured_fields_are_redacted() {
        let lines = capture(|| {
            tracing::warn!(target: "auth", email = "bob@x.com", attempts = 3, "login failed");
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" auth WARNING "));
        assert!(lines[0].ends_with(": login failed;email=***;attempts=3"));
        assert!(!lines[0].contains("bob@x.com"));
    }

    #[test]
    fn test_formatted_message_is_redacted() {
        let secret = "hunter2";
        let lines = capture(|| {
            tracing::error!(target: "auth", "password={}", secret);
        });
        assert!(lines[0].ends_with(": password=***;"));
    }

    #[test]
    fn test_field_value_with_separator_is_fully_redacted() {
        let lines = capture(|| {
            tracing::warn!(target: "auth", password = "hunter2;tail-secret", "login failed");
        });
        assert!(lines[0].ends_with(": login failed;password=***;"));
        assert!(!lines[0].contains("hunter2"));
        assert!(!lines[0].contains("tail-secret"));
    }

    #[test]
    fn test_field_name_suffix_is_covered() {
        let lines = capture(|| {
            tracing::info!(target: "auth", username = ?"bob;admin=yes", "lookup");
        });
        assert!(lines[0].ends_with(": lookup;username=***;"));
        assert!(!lines[0].contains("admin=yes"));
    }

    #[test]
    fn test_event_without_message() {
        let lines = capture(|| {
            tracing::debug!(target: "store", user_id = 7u64);
        });
        assert!(lines[0].ends_with(": user_id=7"));
    }
}
