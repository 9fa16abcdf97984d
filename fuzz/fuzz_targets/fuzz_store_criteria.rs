//! Fuzz target for store lookups and updates with arbitrary criteria.
//!
//! Unknown names and mistyped values must come back as errors, never
//! panics, and a rejected update must leave the record unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ug_redact::CredentialHash;
use ug_store::{AttributeValue, UserStore};

const PHC: &str = "$argon2id$v=19$m=8,t=1,p=1$c29tZXNhbHRzb21lc2FsdA$Zm9vYmFyYmF6cXV4";

fuzz_target!(|data: &[u8]| {
    let Ok(criteria) = serde_json::from_slice::<Vec<(String, AttributeValue)>>(data) else {
        return;
    };

    let store = UserStore::in_memory();
    let hash = CredentialHash::parse(PHC).unwrap();
    let user = store.add("a@b.c", hash).unwrap();

    let _ = store.find_by(criteria.clone());
    if store.update_by_id(user.id, criteria).is_err() {
        let unchanged = store.find_by([("id", user.id)]).unwrap();
        assert_eq!(unchanged, user);
    }
});
