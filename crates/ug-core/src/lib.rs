//! userguard core library.
//!
//! - Redacted logging: sinks, emitters, and a tracing layer
//! - Configuration loading and resolution
//! - Registration and login over the user store
//! - Exit codes for the `ug` CLI
//!
//! The binary entry point is in `main.rs`.

pub mod auth;
pub mod config;
pub mod exit_codes;
pub mod logging;

pub use auth::{Auth, AuthError};
pub use config::{ConfigError, ConfigSource, CoreConfig};
