//! Integration tests for the auth facade over a shared store.

use std::sync::{Arc, Barrier};
use std::thread;

use ug_core::{Auth, AuthError};
use ug_redact::{CredentialHasher, HashCost};
use ug_store::{InMemoryBackend, UserStore};

fn hasher() -> CredentialHasher {
    CredentialHasher::new(HashCost {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

#[test]
fn registered_user_is_findable_in_store() {
    let backend = Arc::new(InMemoryBackend::new());
    let auth = Auth::new(UserStore::new(Arc::clone(&backend)), hasher());

    let user = auth.register_user("bob@bob.com", "mySecuredPwd").unwrap();

    let reader = UserStore::new(Arc::clone(&backend));
    let stored = reader.find_by([("email", "bob@bob.com")]).unwrap();
    assert_eq!(stored.id, user.id);
    assert!(hasher().verify("mySecuredPwd", &stored.hashed_password));
}

#[test]
fn concurrent_registration_of_same_email() {
    let auth = Arc::new(Auth::in_memory(hasher()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let auth = Arc::clone(&auth);
            thread::spawn(move || auth.register_user("same@x.com", &format!("pw{}", i)))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let created = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(AuthError::UserAlreadyExists { .. })))
        .count();

    assert_eq!(created, 1);
    assert_eq!(rejected, 3);
    assert_eq!(auth.store().backend().record_count(), 1);
}

#[test]
fn login_survives_unrelated_updates() {
    let auth = Auth::in_memory(hasher());
    let user = auth.register_user("a@b.c", "pw").unwrap();

    auth.store()
        .update_by_id(user.id, [("session_id", "sess-1")])
        .unwrap();

    assert!(auth.valid_login("a@b.c", "pw"));
}

#[test]
fn reset_token_is_accepted_once_under_contention() {
    for round in 0..50 {
        let auth = Arc::new(Auth::in_memory(hasher()));
        auth.register_user("a@b.c", "old").unwrap();
        let token = auth.reset_password_token("a@b.c").unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["first", "second"]
            .into_iter()
            .map(|password| {
                let auth = Arc::clone(&auth);
                let barrier = Arc::clone(&barrier);
                let token = token.clone();
                thread::spawn(move || {
                    barrier.wait();
                    auth.update_password(&token, password)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::InvalidResetToken)))
            .count();
        assert_eq!((accepted, rejected), (1, 1), "round {}", round);

        let stored = auth.store().find_by([("email", "a@b.c")]).unwrap();
        assert_eq!(stored.reset_token, None);
        assert!(!auth.valid_login("a@b.c", "old"));
    }
}
