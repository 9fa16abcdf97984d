//! Persistence collaborator interface.
//!
//! The store never owns durable state; it talks to a [`Backend`] that
//! assigns ids, answers queries, and hands out exclusive transactions for
//! read-modify-write updates. Implementations must serialize transactions
//! that touch the same record.

mod memory;

pub use memory::InMemoryBackend;

use crate::error::BackendError;
use crate::schema::{NewUser, Predicate, UserId, UserRecord};

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Storage engine for user records.
pub trait Backend: Send + Sync {
    /// Store a new record and return its assigned id.
    fn insert(&self, user: NewUser) -> BackendResult<UserId>;

    /// All records matching the predicate, in id order. Empty when nothing
    /// matches.
    fn query_all(&self, predicate: &Predicate) -> BackendResult<Vec<UserRecord>>;

    /// Open an exclusive transaction.
    fn begin(&self) -> BackendResult<Box<dyn Transaction + '_>>;
}

/// An exclusive unit of work. Dropping without [`commit`](Self::commit)
/// discards every staged write.
pub trait Transaction {
    /// Like [`Backend::query_all`], seeing this transaction's staged writes.
    fn query_all(&self, predicate: &Predicate) -> BackendResult<Vec<UserRecord>>;

    /// Stage a full replacement of an existing record.
    fn put(&mut self, record: UserRecord) -> BackendResult<()>;

    /// Make every staged write durable, or none of them.
    fn commit(self: Box<Self>) -> BackendResult<()>;

    /// Discard staged writes.
    fn rollback(self: Box<Self>);
}

impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    fn insert(&self, user: NewUser) -> BackendResult<UserId> {
        (**self).insert(user)
    }

    fn query_all(&self, predicate: &Predicate) -> BackendResult<Vec<UserRecord>> {
        (**self).query_all(predicate)
    }

    fn begin(&self) -> BackendResult<Box<dyn Transaction + '_>> {
        (**self).begin()
    }
}
