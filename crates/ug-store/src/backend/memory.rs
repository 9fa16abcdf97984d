//! In-memory backend.
//!
//! A single mutex guards the table. Transactions hold the guard for their
//! whole lifetime, so concurrent read-modify-write updates are serialized
//! and never lose each other's changes.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{Backend, BackendResult, Transaction};
use crate::error::BackendError;
use crate::schema::{NewUser, Predicate, UserId, UserRecord};

#[derive(Debug, Default)]
struct Table {
    last_id: u64,
    rows: BTreeMap<UserId, UserRecord>,
}

impl Table {
    fn email_taken(&self, email: &str) -> bool {
        self.rows.values().any(|row| row.email == email)
    }
}

/// Process-local user table.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    table: Mutex<Table>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn record_count(&self) -> usize {
        self.lock().map(|t| t.rows.len()).unwrap_or(0)
    }

    fn lock(&self) -> BackendResult<MutexGuard<'_, Table>> {
        self.table
            .lock()
            .map_err(|_| BackendError::Unavailable("user table lock poisoned".to_string()))
    }
}

impl Backend for InMemoryBackend {
    fn insert(&self, user: NewUser) -> BackendResult<UserId> {
        let mut table = self.lock()?;
        if table.email_taken(&user.email) {
            return Err(BackendError::UniqueViolation { field: "email" });
        }
        table.last_id += 1;
        let id = UserId::new(table.last_id);
        table.rows.insert(id, user.into_record(id));
        Ok(id)
    }

    fn query_all(&self, predicate: &Predicate) -> BackendResult<Vec<UserRecord>> {
        let table = self.lock()?;
        Ok(table
            .rows
            .values()
            .filter(|row| predicate.matches(row))
            .cloned()
            .collect())
    }

    fn begin(&self) -> BackendResult<Box<dyn Transaction + '_>> {
        let table = self.lock()?;
        Ok(Box::new(MemoryTransaction {
            table,
            staged: BTreeMap::new(),
        }))
    }
}

struct MemoryTransaction<'a> {
    table: MutexGuard<'a, Table>,
    staged: BTreeMap<UserId, UserRecord>,
}

impl Transaction for MemoryTransaction<'_> {
    fn query_all(&self, predicate: &Predicate) -> BackendResult<Vec<UserRecord>> {
        Ok(self
            .table
            .rows
            .values()
            .map(|row| self.staged.get(&row.id).unwrap_or(row))
            .filter(|row| predicate.matches(row))
            .cloned()
            .collect())
    }

    fn put(&mut self, record: UserRecord) -> BackendResult<()> {
        if !self.table.rows.contains_key(&record.id) {
            return Err(BackendError::MissingRow { id: record.id });
        }
        self.staged.insert(record.id, record);
        Ok(())
    }

    fn commit(self: Box<Self>) -> BackendResult<()> {
        let MemoryTransaction { mut table, staged } = *self;

        // Uniqueness is checked against the table as it would look after
        // the commit.
        let email_after = |row: &UserRecord| -> String {
            staged
                .get(&row.id)
                .map(|r| r.email.clone())
                .unwrap_or_else(|| row.email.clone())
        };
        for record in staged.values() {
            let clash = table
                .rows
                .values()
                .any(|row| row.id != record.id && email_after(row) == record.email);
            if clash {
                return Err(BackendError::UniqueViolation { field: "email" });
            }
        }

        for (id, record) in staged {
            table.rows.insert(id, record);
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}
