//! Error types for redaction and credential hashing.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur during redaction or hashing.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// A stored credential hash could not be decoded.
    ///
    /// Only surfaced by explicit parsing; verification maps it to `false`.
    #[error("malformed credential hash: {0}")]
    HashDecode(String),

    /// Hash derivation failed (bad cost parameters or no entropy source).
    #[error("hashing error: {0}")]
    HashingError(String),

    /// The redaction policy or field set is invalid.
    #[error("policy error: {0}")]
    PolicyError(String),

    /// I/O error during policy file operations.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RedactionError {
    /// Create a policy error from anything printable.
    pub fn policy(msg: impl Into<String>) -> Self {
        RedactionError::PolicyError(msg.into())
    }
}
