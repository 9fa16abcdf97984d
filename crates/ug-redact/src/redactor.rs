//! Field-aware log line redaction.
//!
//! Replaces the value of every `field=value` assignment whose field name is
//! in the configured set. A value runs from just after `=` up to the first
//! separator or the end of the line. The replacement is always
//! `field=<marker><separator>`: an assignment that ended at end-of-line
//! comes out separator-terminated, so redacted lines are uniformly shaped.
//!
//! Field names are matched as literal substrings with no word boundary, so
//! with `name` in the set, `username=bob` is redacted too. A value that
//! contains the separator unescaped is cut at that separator; the remainder
//! is left as ordinary text.

use crate::error::{RedactionError, Result};
use crate::field_spec::FieldSpec;
use crate::policy::RedactionPolicy;

/// Default replacement for redacted values.
pub const DEFAULT_MARKER: &str = "***";

/// Default assignment separator.
pub const DEFAULT_SEPARATOR: char = ';';

/// Redact `field=value` assignments in `message`.
///
/// Fields are applied in order, each over the output of the previous one.
/// Empty field names are skipped. Text outside redacted values is copied
/// through unchanged.
pub fn redact<S: AsRef<str>>(fields: &[S], marker: &str, separator: char, message: &str) -> String {
    let mut current = message.to_string();
    for field in fields {
        let field = field.as_ref();
        if field.is_empty() {
            continue;
        }
        let (next, count) = redact_field(field, marker, separator, &current);
        if count > 0 {
            current = next;
        }
    }
    current
}

/// Redact every occurrence of a single field, returning the new line and
/// how many values were replaced.
fn redact_field(field: &str, marker: &str, separator: char, message: &str) -> (String, usize) {
    let needle_len = field.len() + 1;
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    let mut count = 0;

    while let Some(pos) = find_assignment(rest, field) {
        let value_start = pos + needle_len;
        out.push_str(&rest[..value_start]);
        out.push_str(marker);
        out.push(separator);
        count += 1;

        let value = &rest[value_start..];
        rest = match value.find(separator) {
            Some(end) => &value[end + separator.len_utf8()..],
            None => "",
        };
    }

    out.push_str(rest);
    (out, count)
}

/// Byte offset of the next `field=` in `haystack`.
fn find_assignment(haystack: &str, field: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = haystack[from..].find(field) {
        let pos = from + rel;
        let after = pos + field.len();
        if haystack[after..].starts_with('=') {
            return Some(pos);
        }
        // Advance by one character so multi-byte field names stay aligned.
        from = pos
            + haystack[pos..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
    }
    None
}

/// Outcome of redacting one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedLine {
    /// The redacted text.
    pub output: String,
    /// Number of values replaced across all fields.
    pub substitutions: usize,
}

impl RedactedLine {
    /// Whether anything was replaced.
    pub fn was_modified(&self) -> bool {
        self.substitutions > 0
    }
}

/// A field set, marker, and separator bundled for repeated use.
///
/// Immutable once built; share it freely across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRedactor {
    fields: FieldSpec,
    marker: String,
    separator: char,
}

impl FieldRedactor {
    /// Create a redactor.
    ///
    /// Fails if a field name contains the separator, since such a field
    /// could never be matched as a whole assignment.
    pub fn new(fields: FieldSpec, marker: impl Into<String>, separator: char) -> Result<Self> {
        if separator == '=' {
            return Err(RedactionError::policy("separator must not be '='"));
        }
        fields.check_separator(separator)?;
        Ok(Self {
            fields,
            marker: marker.into(),
            separator,
        })
    }

    /// Create a redactor from a policy.
    pub fn from_policy(policy: &RedactionPolicy) -> Result<Self> {
        policy.validate()?;
        Self::new(policy.fields.clone(), policy.marker.clone(), policy.separator)
    }

    /// Redact a line.
    pub fn redact(&self, message: &str) -> String {
        redact(self.fields.as_slice(), &self.marker, self.separator, message)
    }

    /// Redact a line and report how many values were replaced.
    pub fn redact_with_count(&self, message: &str) -> RedactedLine {
        let mut output = message.to_string();
        let mut substitutions = 0;
        for field in self.fields.iter() {
            let (next, count) = redact_field(field, &self.marker, self.separator, &output);
            if count > 0 {
                output = next;
                substitutions += count;
            }
        }
        RedactedLine {
            output,
            substitutions,
        }
    }

    /// The configured field set.
    pub fn fields(&self) -> &FieldSpec {
        &self.fields
    }

    /// The configured marker.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// The configured separator.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Whether an assignment to `name` would have its value redacted.
    ///
    /// Follows the substring rule of [`redact`]: `name=` matches when it
    /// ends with `field=` for some configured field.
    pub fn covers(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|field| !field.is_empty() && name.ends_with(field))
    }
}

impl Default for FieldRedactor {
    fn default() -> Self {
        Self {
            fields: FieldSpec::pii(),
            marker: DEFAULT_MARKER.to_string(),
            separator: DEFAULT_SEPARATOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_middle_field() {
        assert_eq!(
            redact(&["password"], "xxx", ';', "name=Bob;password=secret;age=9"),
            "name=Bob;password=xxx;age=9"
        );
    }

    #[test]
    fn test_trailing_field_gets_separator() {
        assert_eq!(
            redact(&["password"], "xxx", ';', "name=Bob;password=secret"),
            "name=Bob;password=xxx;"
        );
    }

    #[test]
    fn test_leading_field() {
        assert_eq!(
            redact(&["ssn"], "***", ';', "ssn=123-45-6789;email=a@b.com;"),
            "ssn=***;email=a@b.com;"
        );
    }

    #[test]
    fn test_multiple_fields_in_order() {
        assert_eq!(
            redact(
                &["email", "ssn", "password"],
                "xxx",
                ';',
                "name=egg;email=eggmin@eggsample.com;password=eggcellent;date_of_birth=12/12/1986;"
            ),
            "name=egg;email=xxx;password=xxx;date_of_birth=12/12/1986;"
        );
    }

    #[test]
    fn test_repeated_occurrences() {
        assert_eq!(
            redact(&["token"], "-", ';', "token=a;x=1;token=b"),
            "token=-;x=1;token=-;"
        );
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(redact(&["pw"], "xxx", ';', "pw=;a=1"), "pw=xxx;a=1");
        assert_eq!(redact(&["pw"], "xxx", ';', "pw="), "pw=xxx;");
    }

    #[test]
    fn test_absent_field_unchanged() {
        let line = "user=bob;role=admin;";
        assert_eq!(redact(&["ssn", "email"], "xxx", ';', line), line);
    }

    #[test]
    fn test_empty_field_list_unchanged() {
        let fields: [&str; 0] = [];
        assert_eq!(redact(&fields, "xxx", ';', "password=x"), "password=x");
    }

    #[test]
    fn test_empty_field_name_skipped() {
        assert_eq!(redact(&[""], "xxx", ';', "a=b"), "a=b");
    }

    #[test]
    fn test_field_without_assignment_untouched() {
        assert_eq!(
            redact(&["password"], "xxx", ';', "password reset for password=abc"),
            "password reset for password=xxx;"
        );
    }

    #[test]
    fn test_substring_field_names_match() {
        assert_eq!(
            redact(&["name"], "xxx", ';', "username=bob;"),
            "username=xxx;"
        );
    }

    #[test]
    fn test_value_with_separator_truncates() {
        assert_eq!(
            redact(&["password"], "xxx", ';', "password=a;b;c=1"),
            "password=xxx;b;c=1"
        );
    }

    #[test]
    fn test_custom_separator() {
        assert_eq!(
            redact(&["email"], "[R]", '|', "email=a@b.c|ssn=1"),
            "email=[R]|ssn=1"
        );
    }

    #[test]
    fn test_multibyte_separator_and_marker() {
        assert_eq!(
            redact(&["név"], "█", '¦', "név=Ödön¦kor=9"),
            "név=█¦kor=9"
        );
        assert_eq!(redact(&["név"], "█", '¦', "név=Ödön"), "név=█¦");
    }

    #[test]
    fn test_later_fields_see_rewritten_line() {
        // "b" swallows "a=1" as its value, so "a" has nothing left to match.
        assert_eq!(redact(&["b", "a"], "X", ';', "b=a=1;c=2"), "b=X;c=2");
        assert_eq!(redact(&["a", "b"], "X", ';', "b=a=1;c=2"), "b=X;c=2");
    }

    #[test]
    fn test_redactor_counts() {
        let redactor = FieldRedactor::default();
        let line = redactor.redact_with_count("name=Bob;email=b@c.d;phone=1;other=2");
        assert_eq!(line.output, "name=***;email=***;phone=***;other=2");
        assert_eq!(line.substitutions, 3);
        assert!(line.was_modified());

        let clean = redactor.redact_with_count("nothing here");
        assert!(!clean.was_modified());
        assert_eq!(clean.output, "nothing here");
    }

    #[test]
    fn test_redactor_matches_free_function() {
        let redactor = FieldRedactor::default();
        let line = "name=Bob;ssn=1;password=p";
        assert_eq!(
            redactor.redact(line),
            redact(crate::PII_FIELDS, DEFAULT_MARKER, DEFAULT_SEPARATOR, line)
        );
    }

    #[test]
    fn test_covers_follows_substring_rule() {
        let redactor = FieldRedactor::default();
        assert!(redactor.covers("password"));
        assert!(redactor.covers("username"));
        assert!(!redactor.covers("attempts"));
        assert!(!redactor.covers("emails"));
        assert!(!redactor.covers(""));
    }

    #[test]
    fn test_redactor_rejects_separator_in_field() {
        let fields = FieldSpec::new(["a;b"]).unwrap();
        assert!(FieldRedactor::new(fields, "x", ';').is_err());
        assert!(FieldRedactor::new(FieldSpec::pii(), "x", '=').is_err());
    }
}
