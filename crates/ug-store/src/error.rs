//! Error types for the user store.
//!
//! Absence and backend faults are separate variants so callers can tell
//! "no such user" apart from "the store is broken" without string matching.
//! Messages name attributes but never carry attribute values.

use crate::schema::UserId;
use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors returned by [`UserStore`](crate::UserStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record matched the lookup.
    #[error("no user matching [{criteria}]")]
    NotFound { criteria: String },

    /// The lookup referenced an unknown attribute or was otherwise malformed.
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// An update named an attribute the schema does not allow setting.
    #[error("invalid attribute '{name}': {reason}")]
    InvalidAttribute { name: String, reason: String },

    /// The persistence backend rejected the operation.
    #[error("persistence error: {0}")]
    Persistence(#[from] BackendError),
}

impl StoreError {
    /// Whether this error means no record matched.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Whether this error was caused by a malformed request rather than by
    /// the data or the backend.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidQuery { .. } | StoreError::InvalidAttribute { .. }
        )
    }

    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        StoreError::InvalidQuery {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_attribute(name: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::InvalidAttribute {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by a persistence backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A write would break a uniqueness constraint.
    #[error("unique constraint violated on '{field}'")]
    UniqueViolation { field: &'static str },

    /// A staged write referenced a record that does not exist.
    #[error("no stored user with id {id}")]
    MissingRow { id: UserId },

    /// The backend cannot serve requests (I/O failure, poisoned lock, ...).
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
