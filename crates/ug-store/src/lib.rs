//! User record store for userguard.
//!
//! This crate provides:
//! - A closed user record schema with typed attribute validation
//! - A persistence backend trait with an in-memory implementation
//! - [`UserStore`]: add, find-by-predicate, and validated update-by-id
//!
//! The store never hashes; callers pass an already-derived
//! [`CredentialHash`](ug_redact::CredentialHash).

pub mod backend;
pub mod error;
pub mod schema;
pub mod store;

pub use backend::{Backend, InMemoryBackend, Transaction};
pub use error::{BackendError, Result, StoreError};
pub use schema::{
    Assignment, AttributeValue, NewUser, Predicate, UserAttribute, UserId, UserRecord, ValueKind,
};
pub use store::UserStore;
