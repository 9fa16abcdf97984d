//! User record store.

use tracing::debug;

use crate::backend::{Backend, InMemoryBackend, Transaction};
use crate::error::{Result, StoreError};
use crate::schema::{Assignment, AttributeValue, NewUser, Predicate, UserId, UserRecord};
use ug_redact::CredentialHash;

/// Create, look up, and update user records.
///
/// Holds only a handle to the backend; the backend owns the durable copy.
/// Credentials must already be hashed when they reach the store.
#[derive(Debug)]
pub struct UserStore<B = InMemoryBackend> {
    backend: B,
}

impl UserStore<InMemoryBackend> {
    /// A store over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(InMemoryBackend::new())
    }
}

impl Default for UserStore<InMemoryBackend> {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<B: Backend> UserStore<B> {
    /// Wrap a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Store a new user and return it with its assigned id.
    pub fn add(&self, email: &str, hashed_password: CredentialHash) -> Result<UserRecord> {
        let user = NewUser {
            email: email.to_string(),
            hashed_password,
        };
        let id = self.backend.insert(user.clone())?;
        debug!(user_id = %id, "user added");
        Ok(user.into_record(id))
    }

    /// First record (lowest id) matching every criterion.
    ///
    /// Criteria are `(attribute name, value)` pairs. Unknown names, values
    /// of the wrong type, and an empty criteria list are `InvalidQuery`; no
    /// match is `NotFound`.
    pub fn find_by<I, K, V>(&self, criteria: I) -> Result<UserRecord>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        let predicate = Predicate::parse(criteria)?;
        self.find(&predicate)
    }

    /// Like [`find_by`](Self::find_by) for an already-built predicate.
    pub fn find(&self, predicate: &Predicate) -> Result<UserRecord> {
        if predicate.is_empty() {
            return Err(StoreError::invalid_query("empty predicate"));
        }
        let rows = self.backend.query_all(predicate)?;
        first_match(rows, predicate)
    }

    /// Set attributes on the record with the given id.
    ///
    /// Every attribute is validated before anything is written; an unknown
    /// or immutable name fails the whole update with `InvalidAttribute` and
    /// the stored record is left untouched.
    pub fn update_by_id<I, K, V>(&self, id: UserId, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        self.update_where(&Predicate::id(id), attributes)?;
        Ok(())
    }

    /// Set attributes on the first record (lowest id) matching `predicate`
    /// and return the updated record.
    ///
    /// The lookup and the write share one backend transaction, so a
    /// predicate over an attribute being changed holds for exactly one
    /// caller. An empty predicate is `InvalidQuery`.
    pub fn update_where<I, K, V>(&self, predicate: &Predicate, attributes: I) -> Result<UserRecord>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        if predicate.is_empty() {
            return Err(StoreError::invalid_query("empty predicate"));
        }
        let tx = self.backend.begin()?;
        match stage_update(&*tx, predicate, attributes) {
            Ok(record) => {
                let mut tx = tx;
                tx.put(record.clone())?;
                tx.commit()?;
                debug!(user_id = %record.id, "user updated");
                Ok(record)
            }
            Err(err) => {
                tx.rollback();
                Err(err)
            }
        }
    }
}

/// Look up the record inside the transaction and apply validated changes
/// to an in-memory copy.
fn stage_update<I, K, V>(
    tx: &dyn Transaction,
    predicate: &Predicate,
    attributes: I,
) -> Result<UserRecord>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<AttributeValue>,
{
    let mut record = first_match(tx.query_all(predicate)?, predicate)?;

    let assignments = attributes
        .into_iter()
        .map(|(name, value)| Assignment::parse(name.as_ref(), value.into()))
        .collect::<Result<Vec<_>>>()?;

    for assignment in assignments {
        assignment.apply(&mut record);
    }
    Ok(record)
}

fn first_match(rows: Vec<UserRecord>, predicate: &Predicate) -> Result<UserRecord> {
    rows.into_iter()
        .min_by_key(|row| row.id)
        .ok_or_else(|| StoreError::NotFound {
            criteria: predicate.describe(),
        })
}
