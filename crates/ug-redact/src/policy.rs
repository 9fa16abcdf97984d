//! Redaction policy configuration.
//!
//! Holds the tunables that decide what gets redacted and how: the sensitive
//! field set, the replacement marker, and the assignment separator.

use crate::field_spec::FieldSpec;
use crate::redactor::{DEFAULT_MARKER, DEFAULT_SEPARATOR};
use crate::{RedactionError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema version for the policy file.
pub const POLICY_SCHEMA_VERSION: &str = "1.0.0";

/// Redaction policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionPolicy {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Sensitive field names, applied in order.
    #[serde(default)]
    pub fields: FieldSpec,

    /// Replacement for redacted values.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Separator between assignments.
    #[serde(default = "default_separator")]
    pub separator: char,
}

fn default_schema_version() -> String {
    POLICY_SCHEMA_VERSION.to_string()
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

impl RedactionPolicy {
    /// Create a new policy with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load policy from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy: RedactionPolicy = serde_json::from_str(&content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Save policy to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the policy for values that would make redaction unreliable.
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_empty() {
            return Err(RedactionError::policy("redaction marker must not be empty"));
        }
        if self.separator == '=' {
            return Err(RedactionError::policy("separator must not be '='"));
        }
        if self.separator.is_whitespace() && self.separator != ' ' {
            return Err(RedactionError::policy(format!(
                "separator {:?} is not printable",
                self.separator
            )));
        }
        self.fields.check_separator(self.separator)
    }

    /// Replace the field set.
    pub fn with_fields(mut self, fields: FieldSpec) -> Self {
        self.fields = fields;
        self
    }

    /// Replace the marker.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Replace the separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            schema_version: POLICY_SCHEMA_VERSION.to_string(),
            fields: FieldSpec::pii(),
            marker: DEFAULT_MARKER.to_string(),
            separator: DEFAULT_SEPARATOR,
        }
    }
}
