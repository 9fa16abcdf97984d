//! Integration tests for ug-store.
//!
//! These tests verify:
//! - Record lifecycle: add, find, update
//! - Failure kinds stay distinct (not found, invalid request, backend fault)
//! - A failed commit leaves no partial state behind
//! - Concurrent updates to one record with disjoint attributes both land

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ug_redact::{CredentialHash, CredentialHasher, HashCost};
use ug_store::{
    Backend, BackendError, InMemoryBackend, NewUser, Predicate, StoreError, Transaction, UserId,
    UserRecord, UserStore,
};

fn hasher() -> CredentialHasher {
    CredentialHasher::new(HashCost {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_add_find_update_lifecycle() {
    let hasher = hasher();
    let store = UserStore::in_memory();

    let hash = hasher.hash("b4l0u").unwrap();
    let user = store.add("bob@dylan.com", hash.clone()).unwrap();
    assert_eq!(user.session_id, None);

    let found = store.find_by([("email", "bob@dylan.com")]).unwrap();
    assert_eq!(found.id, user.id);
    assert!(hasher.verify("b4l0u", &found.hashed_password));

    let new_hash = hasher.hash("new-pass").unwrap();
    store
        .update_by_id(
            user.id,
            [
                ("hashed_password", new_hash.as_str()),
                ("reset_token", "reset-me"),
            ],
        )
        .unwrap();

    let updated = store.find_by([("reset_token", "reset-me")]).unwrap();
    assert_eq!(updated.id, user.id);
    assert!(hasher.verify("new-pass", &updated.hashed_password));
    assert!(!hasher.verify("b4l0u", &updated.hashed_password));
}

#[test]
fn test_find_returns_lowest_id_on_multiple_matches() {
    let hasher = hasher();
    let store = UserStore::in_memory();
    let first = store.add("one@x.com", hasher.hash("p").unwrap()).unwrap();
    let second = store.add("two@x.com", hasher.hash("p").unwrap()).unwrap();

    store.update_by_id(second.id, [("session_id", "shared")]).unwrap();
    store.update_by_id(first.id, [("session_id", "shared")]).unwrap();

    let found = store.find_by([("session_id", "shared")]).unwrap();
    assert_eq!(found.id, first.id);
}

#[test]
fn test_error_kinds_are_distinct() {
    let store = UserStore::in_memory();
    store.add("a@b.com", hasher().hash("p").unwrap()).unwrap();

    let not_found = store.find_by([("email", "z@b.com")]).unwrap_err();
    let invalid = store.find_by([("password", "p")]).unwrap_err();
    let duplicate = store.add("a@b.com", hasher().hash("p").unwrap()).unwrap_err();

    assert!(matches!(not_found, StoreError::NotFound { .. }));
    assert!(matches!(invalid, StoreError::InvalidQuery { .. }));
    assert!(matches!(duplicate, StoreError::Persistence(_)));
}

// ============================================================================
// Failure Atomicity
// ============================================================================

/// Backend that forwards to an in-memory table but can refuse commits.
struct FlakyBackend {
    inner: InMemoryBackend,
    fail_commit: Arc<AtomicBool>,
}

struct FlakyTransaction<'a> {
    inner: Box<dyn Transaction + 'a>,
    fail_commit: bool,
}

impl Transaction for FlakyTransaction<'_> {
    fn query_all(&self, predicate: &Predicate) -> Result<Vec<UserRecord>, BackendError> {
        self.inner.query_all(predicate)
    }

    fn put(&mut self, record: UserRecord) -> Result<(), BackendError> {
        self.inner.put(record)
    }

    fn commit(self: Box<Self>) -> Result<(), BackendError> {
        if self.fail_commit {
            self.inner.rollback();
            return Err(BackendError::Unavailable("disk full".to_string()));
        }
        self.inner.commit()
    }

    fn rollback(self: Box<Self>) {
        self.inner.rollback();
    }
}

impl Backend for FlakyBackend {
    fn insert(&self, user: NewUser) -> Result<UserId, BackendError> {
        self.inner.insert(user)
    }

    fn query_all(&self, predicate: &Predicate) -> Result<Vec<UserRecord>, BackendError> {
        self.inner.query_all(predicate)
    }

    fn begin(&self) -> Result<Box<dyn Transaction + '_>, BackendError> {
        Ok(Box::new(FlakyTransaction {
            inner: self.inner.begin()?,
            fail_commit: self.fail_commit.load(Ordering::SeqCst),
        }))
    }
}

#[test]
fn test_failed_commit_is_persistence_error_and_leaves_record_unchanged() {
    let fail_commit = Arc::new(AtomicBool::new(false));
    let store = UserStore::new(FlakyBackend {
        inner: InMemoryBackend::new(),
        fail_commit: fail_commit.clone(),
    });
    let user = store.add("a@b.com", hasher().hash("p").unwrap()).unwrap();

    fail_commit.store(true, Ordering::SeqCst);
    let err = store
        .update_by_id(user.id, [("session_id", "s"), ("reset_token", "r")])
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(BackendError::Unavailable(_))
    ));

    let found = store.find(&Predicate::id(user.id)).unwrap();
    assert_eq!(found, user);
}

#[test]
fn test_invalid_attribute_never_reaches_commit() {
    let fail_commit = Arc::new(AtomicBool::new(true));
    let store = UserStore::new(FlakyBackend {
        inner: InMemoryBackend::new(),
        fail_commit,
    });
    let user = store.add("a@b.com", hasher().hash("p").unwrap()).unwrap();

    // Validation fails first, so the commit failure is never observed.
    let err = store
        .update_by_id(user.id, [("session_id", "s"), ("nonexistentAttr", "x")])
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidAttribute { .. }));
    assert_eq!(store.find(&Predicate::id(user.id)).unwrap(), user);
}

#[test]
fn test_rejected_update_with_duplicate_email() {
    let store = UserStore::in_memory();
    store.add("a@b.com", hasher().hash("p").unwrap()).unwrap();
    let b = store.add("b@b.com", hasher().hash("p").unwrap()).unwrap();

    let err = store
        .update_by_id(b.id, [("email", "a@b.com"), ("session_id", "s")])
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Persistence(BackendError::UniqueViolation { .. })
    ));
    assert_eq!(store.find(&Predicate::id(b.id)).unwrap(), b);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_disjoint_updates_both_apply() {
    let hash: CredentialHash = hasher().hash("p").unwrap();

    for _ in 0..50 {
        let store = Arc::new(UserStore::in_memory());
        let user = store.add("a@b.com", hash.clone()).unwrap();

        let s1 = Arc::clone(&store);
        let t1 = thread::spawn(move || s1.update_by_id(user.id, [("session_id", "sess")]));
        let s2 = Arc::clone(&store);
        let t2 = thread::spawn(move || s2.update_by_id(user.id, [("reset_token", "tok")]));

        t1.join().unwrap().unwrap();
        t2.join().unwrap().unwrap();

        let found = store.find(&Predicate::id(user.id)).unwrap();
        assert_eq!(found.session_id.as_deref(), Some("sess"));
        assert_eq!(found.reset_token.as_deref(), Some("tok"));
    }
}

#[test]
fn test_shared_backend_through_arc() {
    let backend = Arc::new(InMemoryBackend::new());
    let writer = UserStore::new(Arc::clone(&backend));
    let reader = UserStore::new(Arc::clone(&backend));

    let user = writer.add("a@b.com", hasher().hash("p").unwrap()).unwrap();
    assert_eq!(reader.find_by([("id", user.id)]).unwrap(), user);
    assert_eq!(backend.record_count(), 1);
}
