//! Fuzz target for stored credential hash decoding and verification.
//!
//! Verification runs with the smallest cost, so any hash it accepts to
//! check is bounded to a few dozen KiB of work.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ug_redact::{CredentialHash, CredentialHasher, HashCost};

fuzz_target!(|data: &[u8]| {
    if let Ok(hash) = CredentialHash::from_bytes(data) {
        assert_eq!(hash.as_bytes(), data);

        let hasher = CredentialHasher::new(HashCost {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .expect("minimal cost is valid");
        let _ = hasher.verify("secret", &hash);
    }
});
