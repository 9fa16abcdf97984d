//! Fuzz target for redaction policy parsing.
//!
//! Parsing and validating arbitrary JSON must never panic, and any policy
//! that validates must build a working redactor.

#![no_main]

use libfuzzer_sys::fuzz_target;
use ug_redact::{FieldRedactor, RedactionPolicy};

fuzz_target!(|data: &[u8]| {
    if let Ok(policy) = serde_json::from_slice::<RedactionPolicy>(data) {
        if policy.validate().is_ok() {
            let redactor = FieldRedactor::from_policy(&policy).unwrap();
            let _ = redactor.redact("name=x;email=y;password=z");
        }
    }
});
