//! Fuzz target for field redaction.
//!
//! Arbitrary field lists, markers, separators, and lines must never panic,
//! and counted redaction must agree with plain redaction.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ug_redact::{redact, FieldRedactor, FieldSpec};

#[derive(Debug, Arbitrary)]
struct Input {
    fields: Vec<String>,
    marker: String,
    separator: char,
    message: String,
}

fuzz_target!(|input: Input| {
    let _ = redact(&input.fields, &input.marker, input.separator, &input.message);

    let Ok(spec) = FieldSpec::new(input.fields.iter().filter(|f| !f.is_empty()).cloned()) else {
        return;
    };
    let Ok(redactor) = FieldRedactor::new(spec, input.marker.clone(), input.separator) else {
        return;
    };
    let counted = redactor.redact_with_count(&input.message);
    assert_eq!(redactor.redact(&input.message), counted.output);
    if counted.substitutions == 0 {
        assert_eq!(counted.output, input.message);
    }
});
