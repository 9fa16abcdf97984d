//! PII redaction and credential hashing for userguard.
//!
//! Two leaf components that keep sensitive data from leaking:
//!
//! - **Field redaction**: rewrites `field=value` assignments in free-text log
//!   lines so the values of configured sensitive fields never leave the
//!   process.
//! - **Credential hashing**: salted, memory-hard Argon2id hashes of plaintext
//!   secrets, safe for durable storage.
//!
//! # Example
//!
//! ```
//! use ug_redact::{redact, FieldRedactor, FieldSpec};
//!
//! let line = redact(&["password"], "xxx", ';', "name=Bob;password=secret");
//! assert_eq!(line, "name=Bob;password=xxx;");
//!
//! let redactor = FieldRedactor::new(FieldSpec::pii(), "***", ';').unwrap();
//! assert_eq!(redactor.redact("ssn=123-45-6789;"), "ssn=***;");
//! ```

pub mod error;
pub mod field_spec;
pub mod hash;
pub mod policy;
pub mod redactor;

pub use error::{RedactionError, Result};
pub use field_spec::{FieldSpec, PII_FIELDS};
pub use hash::{CredentialHash, CredentialHasher, HashCost, MAX_COST_FACTOR};
pub use policy::{RedactionPolicy, POLICY_SCHEMA_VERSION};
pub use redactor::{redact, FieldRedactor, RedactedLine, DEFAULT_MARKER, DEFAULT_SEPARATOR};
