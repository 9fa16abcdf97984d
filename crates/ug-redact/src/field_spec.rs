//! The set of field names treated as sensitive.

use crate::error::{RedactionError, Result};
use serde::{Deserialize, Serialize};

/// Default personally identifiable fields.
pub const PII_FIELDS: &[&str] = &["name", "email", "phone", "ssn", "password"];

/// Ordered, duplicate-free set of sensitive field names.
///
/// Order matters: fields are redacted one after another, and each later
/// name is matched against the output of the earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FieldSpec {
    fields: Vec<String>,
}

impl FieldSpec {
    /// Build a field set, keeping the first occurrence of each name.
    ///
    /// Names must be non-empty and must not contain `=`.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if field.is_empty() {
                return Err(RedactionError::policy("field name must not be empty"));
            }
            if field.contains('=') {
                return Err(RedactionError::policy(format!(
                    "field name '{}' must not contain '='",
                    field
                )));
            }
            if !out.contains(&field) {
                out.push(field);
            }
        }
        Ok(Self { fields: out })
    }

    /// A field set with no members; redaction becomes a no-op.
    pub fn empty() -> Self {
        Self { fields: Vec::new() }
    }

    /// The default PII field set.
    pub fn pii() -> Self {
        Self {
            fields: PII_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Parse a comma-separated list, ignoring surrounding whitespace.
    pub fn parse_list(list: &str) -> Result<Self> {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        )
    }

    /// Check that no field name contains the given separator.
    pub fn check_separator(&self, separator: char) -> Result<()> {
        if let Some(field) = self.fields.iter().find(|f| f.contains(separator)) {
            return Err(RedactionError::policy(format!(
                "field name '{}' contains the separator '{}'",
                field, separator
            )));
        }
        Ok(())
    }

    /// Iterate over field names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Field names as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.fields
    }

    /// Whether the set contains a name.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::pii()
    }
}

impl TryFrom<Vec<String>> for FieldSpec {
    type Error = RedactionError;

    fn try_from(fields: Vec<String>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<FieldSpec> for Vec<String> {
    fn from(spec: FieldSpec) -> Self {
        spec.fields
    }
}

impl std::fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fields.join(","))
    }
}
