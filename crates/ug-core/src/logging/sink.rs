//! Redacting log sink.
//!
//! Every message is run through a [`FieldRedactor`] before it is formatted,
//! so the emitter only ever sees the redacted text.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ug_redact::{FieldRedactor, RedactionPolicy};

use super::config::{LogConfig, LogFormat};

/// Timestamp layout for human lines, e.g. `2024-05-01 12:00:00,123`.
const HUMAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Log levels for records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARNING",
            Level::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

/// One log record before redaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub logger: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    pub fn new(level: Level, logger: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            level,
            logger: logger.into(),
            timestamp: Utc::now(),
            message: message.into(),
        }
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Destination for formatted log lines.
pub trait Emitter: Send + Sync {
    /// Write one complete line (without trailing newline).
    fn write(&self, line: &str) -> io::Result<()>;
}

impl<E: Emitter + ?Sized> Emitter for Arc<E> {
    fn write(&self, line: &str) -> io::Result<()> {
        (**self).write(line)
    }
}

/// Emitter over any `Write`, one line per record.
pub struct WriterEmitter<W> {
    writer: Mutex<W>,
}

impl WriterEmitter<io::Stderr> {
    /// Emitter writing to stderr.
    pub fn stderr() -> Self {
        WriterEmitter::new(io::stderr())
    }
}

impl WriterEmitter<io::Stdout> {
    /// Emitter writing to stdout.
    pub fn stdout() -> Self {
        WriterEmitter::new(io::stdout())
    }
}

impl<W: Write + Send> WriterEmitter<W> {
    /// Emitter over a custom writer.
    pub fn new(writer: W) -> Self {
        WriterEmitter {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> Emitter for WriterEmitter<W> {
    fn write(&self, line: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()
    }
}

/// Emitter that keeps lines in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryEmitter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Emitter for MemoryEmitter {
    fn write(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory emitter lock poisoned"))?
            .push(line.to_string());
        Ok(())
    }
}

/// A sink that redacts every message before handing it to an emitter.
pub struct RedactingLogSink {
    redactor: FieldRedactor,
    tag: String,
    format: LogFormat,
    emitter: Box<dyn Emitter>,
}

impl RedactingLogSink {
    /// Create a sink with human output and the default tag.
    pub fn new(redactor: FieldRedactor, emitter: Box<dyn Emitter>) -> Self {
        let defaults = LogConfig::default();
        RedactingLogSink {
            redactor,
            tag: defaults.tag,
            format: defaults.format,
            emitter,
        }
    }

    /// Build a sink from a redaction policy and logging config.
    pub fn from_config(
        policy: &RedactionPolicy,
        log: &LogConfig,
        emitter: Box<dyn Emitter>,
    ) -> ug_redact::Result<Self> {
        Ok(RedactingLogSink::new(FieldRedactor::from_policy(policy)?, emitter)
            .with_tag(log.tag.clone())
            .with_format(log.format))
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn redactor(&self) -> &FieldRedactor {
        &self.redactor
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Redact and format a record without emitting it.
    pub fn format_record(&self, record: &LogRecord) -> String {
        let message = self.redactor.redact(&record.message);
        match self.format {
            LogFormat::Human => format!(
                "[{}] {} {} {}: {}",
                self.tag,
                record.logger,
                record.level,
                record.timestamp.format(HUMAN_TIME_FORMAT),
                message
            ),
            LogFormat::Jsonl => serde_json::json!({
                "ts": record.timestamp.to_rfc3339(),
                "tag": self.tag,
                "level": record.level,
                "logger": record.logger,
                "message": message,
            })
            .to_string(),
        }
    }

    /// Redact, format, and write a record.
    pub fn emit(&self, record: &LogRecord) -> io::Result<()> {
        self.emitter.write(&self.format_record(record))
    }
}

impl std::fmt::Debug for RedactingLogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedactingLogSink")
            .field("redactor", &self.redactor)
            .field("tag", &self.tag)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
