//! User record schema.
//!
//! The set of attributes is closed: lookups and updates name attributes by
//! string, and every name is checked against [`UserAttribute`] before any
//! record is touched.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use ug_redact::CredentialHash;

/// Identifier assigned by the persistence backend on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attributes defined on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAttribute {
    /// Backend-assigned id (immutable)
    Id,
    /// Login email (unique)
    Email,
    /// Stored credential hash
    HashedPassword,
    /// Current session token
    SessionId,
    /// Pending password-reset token
    ResetToken,
}

/// The type of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A [`UserId`].
    Id,
    /// A required string.
    Text,
    /// An encoded [`CredentialHash`].
    Credential,
    /// A string that may be unset.
    OptionalText,
}

impl UserAttribute {
    /// Every attribute, in column order.
    pub const ALL: &'static [UserAttribute] = &[
        UserAttribute::Id,
        UserAttribute::Email,
        UserAttribute::HashedPassword,
        UserAttribute::SessionId,
        UserAttribute::ResetToken,
    ];

    /// Column name.
    pub fn name(&self) -> &'static str {
        match self {
            UserAttribute::Id => "id",
            UserAttribute::Email => "email",
            UserAttribute::HashedPassword => "hashed_password",
            UserAttribute::SessionId => "session_id",
            UserAttribute::ResetToken => "reset_token",
        }
    }

    /// Look up an attribute by column name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|attr| attr.name() == name)
    }

    /// The value type this attribute holds.
    pub fn kind(&self) -> ValueKind {
        match self {
            UserAttribute::Id => ValueKind::Id,
            UserAttribute::Email => ValueKind::Text,
            UserAttribute::HashedPassword => ValueKind::Credential,
            UserAttribute::SessionId | UserAttribute::ResetToken => ValueKind::OptionalText,
        }
    }

    /// Whether updates may set this attribute.
    pub fn is_mutable(&self) -> bool {
        !matches!(self, UserAttribute::Id)
    }
}

impl std::fmt::Display for UserAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value supplied for lookup or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Unset optional attribute.
    Null,
    /// Integer (ids).
    Int(u64),
    /// Text (emails, tokens, encoded hashes).
    Text(String),
}

impl AttributeValue {
    fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Null => "null",
            AttributeValue::Int(_) => "integer",
            AttributeValue::Text(_) => "text",
        }
    }

    fn fits(&self, kind: ValueKind) -> bool {
        matches!(
            (kind, self),
            (ValueKind::Id, AttributeValue::Int(_))
                | (ValueKind::Text, AttributeValue::Text(_))
                | (ValueKind::Credential, AttributeValue::Text(_))
                | (ValueKind::OptionalText, AttributeValue::Text(_))
                | (ValueKind::OptionalText, AttributeValue::Null)
        )
    }
}

impl From<UserId> for AttributeValue {
    fn from(id: UserId) -> Self {
        AttributeValue::Int(id.get())
    }
}

impl From<u64> for AttributeValue {
    fn from(v: u64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<&CredentialHash> for AttributeValue {
    fn from(v: &CredentialHash) -> Self {
        AttributeValue::Text(v.as_str().to_string())
    }
}

impl From<CredentialHash> for AttributeValue {
    fn from(v: CredentialHash) -> Self {
        AttributeValue::Text(v.into_string())
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(AttributeValue::Null)
    }
}

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub hashed_password: CredentialHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

impl UserRecord {
    /// Read an attribute as a generic value.
    pub fn get(&self, attr: UserAttribute) -> AttributeValue {
        match attr {
            UserAttribute::Id => self.id.into(),
            UserAttribute::Email => self.email.as_str().into(),
            UserAttribute::HashedPassword => (&self.hashed_password).into(),
            UserAttribute::SessionId => self.session_id.clone().into(),
            UserAttribute::ResetToken => self.reset_token.clone().into(),
        }
    }
}

/// Attributes for a record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: CredentialHash,
}

impl NewUser {
    /// Attach the id the backend assigned.
    pub fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            email: self.email,
            hashed_password: self.hashed_password,
            session_id: None,
            reset_token: None,
        }
    }
}

/// Conjunction of attribute equality tests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Predicate {
    terms: Vec<(UserAttribute, AttributeValue)>,
}

impl Predicate {
    /// Match a single record by id.
    pub fn id(id: UserId) -> Self {
        Self::default().and(UserAttribute::Id, id)
    }

    /// Add an equality test.
    pub fn and(mut self, attr: UserAttribute, value: impl Into<AttributeValue>) -> Self {
        self.terms.push((attr, value.into()));
        self
    }

    /// Build a predicate from attribute names, validating each against the
    /// schema.
    pub fn parse<I, K, V>(criteria: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        let mut predicate = Self::default();
        for (name, value) in criteria {
            let name = name.as_ref();
            let attr = UserAttribute::from_name(name).ok_or_else(|| {
                StoreError::invalid_query(format!("unknown attribute '{}'", name))
            })?;
            let value = value.into();
            if !value.fits(attr.kind()) {
                return Err(StoreError::invalid_query(format!(
                    "attribute '{}' cannot be compared with a {} value",
                    name,
                    value.type_name()
                )));
            }
            predicate.terms.push((attr, value));
        }
        if predicate.is_empty() {
            return Err(StoreError::invalid_query("empty predicate"));
        }
        Ok(predicate)
    }

    /// The equality tests.
    pub fn terms(&self) -> &[(UserAttribute, AttributeValue)] {
        &self.terms
    }

    /// Whether no tests are present.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether a record satisfies every test.
    pub fn matches(&self, record: &UserRecord) -> bool {
        self.terms
            .iter()
            .all(|(attr, value)| record.get(*attr) == *value)
    }

    /// Attribute names, for diagnostics that must not carry values.
    pub fn describe(&self) -> String {
        self.terms
            .iter()
            .map(|(attr, _)| attr.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A validated change to one mutable attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Email(String),
    HashedPassword(CredentialHash),
    SessionId(Option<String>),
    ResetToken(Option<String>),
}

impl Assignment {
    /// Validate a named update against the schema.
    pub fn parse(name: &str, value: AttributeValue) -> Result<Self> {
        let attr = UserAttribute::from_name(name)
            .ok_or_else(|| StoreError::invalid_attribute(name, "not defined on user records"))?;
        if !attr.is_mutable() {
            return Err(StoreError::invalid_attribute(name, "attribute is immutable"));
        }
        if !value.fits(attr.kind()) {
            return Err(StoreError::invalid_attribute(
                name,
                format!("cannot hold a {} value", value.type_name()),
            ));
        }
        let assignment = match (attr, value) {
            (UserAttribute::Email, AttributeValue::Text(email)) => Assignment::Email(email),
            (UserAttribute::HashedPassword, AttributeValue::Text(encoded)) => {
                let hash = CredentialHash::parse(&encoded)
                    .map_err(|_| StoreError::invalid_attribute(name, "not a credential hash"))?;
                Assignment::HashedPassword(hash)
            }
            (UserAttribute::SessionId, AttributeValue::Text(v)) => Assignment::SessionId(Some(v)),
            (UserAttribute::SessionId, AttributeValue::Null) => Assignment::SessionId(None),
            (UserAttribute::ResetToken, AttributeValue::Text(v)) => Assignment::ResetToken(Some(v)),
            (UserAttribute::ResetToken, AttributeValue::Null) => Assignment::ResetToken(None),
            (attr, value) => {
                return Err(StoreError::invalid_attribute(
                    attr.name(),
                    format!("cannot hold a {} value", value.type_name()),
                ))
            }
        };
        Ok(assignment)
    }

    /// The attribute this assignment sets.
    pub fn attribute(&self) -> UserAttribute {
        match self {
            Assignment::Email(_) => UserAttribute::Email,
            Assignment::HashedPassword(_) => UserAttribute::HashedPassword,
            Assignment::SessionId(_) => UserAttribute::SessionId,
            Assignment::ResetToken(_) => UserAttribute::ResetToken,
        }
    }

    /// Write the value into a record.
    pub fn apply(self, record: &mut UserRecord) {
        match self {
            Assignment::Email(v) => record.email = v,
            Assignment::HashedPassword(v) => record.hashed_password = v,
            Assignment::SessionId(v) => record.session_id = v,
            Assignment::ResetToken(v) => record.reset_token = v,
        }
    }
}
