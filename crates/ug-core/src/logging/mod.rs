//! Redacted logging for userguard.
//!
//! All log output goes through a [`RedactingLogSink`]: direct calls to
//! [`RedactingLogSink::emit`] and `tracing` events alike (via
//! [`RedactingLayer`]). There is no global logger; sinks are built from
//! configuration and passed where they are needed.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use ug_core::logging::{init_logging, LogConfig, RedactingLogSink, WriterEmitter};
//! use ug_redact::RedactionPolicy;
//!
//! let config = LogConfig::default();
//! let sink = RedactingLogSink::from_config(
//!     &RedactionPolicy::default(),
//!     &config,
//!     Box::new(WriterEmitter::stderr()),
//! )?;
//! init_logging(&config, Arc::new(sink))?;
//!
//! tracing::info!(target: "user_data", "name=Bob;email=bob@dylan.com");
//! // [USERGUARD] user_data INFO 2024-05-01 12:00:00,000: name=***;email=***;
//! ```

pub mod config;
pub mod layer;
pub mod sink;

pub use config::{LogConfig, LogFormat, LogLevel, DEFAULT_LOGGER, DEFAULT_TAG};
pub use layer::RedactingLayer;
pub use sink::{Emitter, Level, LogRecord, MemoryEmitter, RedactingLogSink, WriterEmitter};

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LogConfig, sink: Arc<RedactingLogSink>) -> Result<(), TryInitError> {
    let filter = EnvFilter::new(config.level.to_string());

    tracing_subscriber::registry()
        .with(filter)
        .with(RedactingLayer::new(sink))
        .try_init()
}
