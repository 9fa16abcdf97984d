//! Registration and login on top of the user store.
//!
//! The store never sees a plaintext secret: [`Auth`] hashes before writing
//! and verifies after reading.

use thiserror::Error;
use tracing::{debug, info};
use ug_redact::{CredentialHasher, RedactionError};
use ug_store::{
    AttributeValue, Backend, BackendError, InMemoryBackend, Predicate, StoreError, UserAttribute,
    UserRecord, UserStore,
};
use uuid::Uuid;

/// Errors from the auth facade.
///
/// Messages never include the email or secret involved.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("a user with this email already exists")]
    UserAlreadyExists { email: String },

    #[error("reset token is not valid")]
    InvalidResetToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),
}

pub type Result<T> = std::result::Result<T, AuthError>;

/// Credential checks over a [`UserStore`].
#[derive(Debug)]
pub struct Auth<B = InMemoryBackend> {
    store: UserStore<B>,
    hasher: CredentialHasher,
}

impl Auth<InMemoryBackend> {
    /// Auth over a fresh in-memory store.
    pub fn in_memory(hasher: CredentialHasher) -> Self {
        Auth::new(UserStore::in_memory(), hasher)
    }
}

impl<B: Backend> Auth<B> {
    pub fn new(store: UserStore<B>, hasher: CredentialHasher) -> Self {
        Auth { store, hasher }
    }

    pub fn store(&self) -> &UserStore<B> {
        &self.store
    }

    /// Hash the password and store a new user.
    ///
    /// Fails with `UserAlreadyExists` if the email is taken.
    pub fn register_user(&self, email: &str, password: &str) -> Result<UserRecord> {
        match self.store.find_by([("email", email)]) {
            Ok(_) => return Err(already_exists(email)),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err.into()),
        }

        let hash = self.hasher.hash(password)?;
        match self.store.add(email, hash) {
            Ok(user) => {
                info!(user_id = %user.id, "user registered");
                Ok(user)
            }
            // Lost a race with a concurrent registration.
            Err(StoreError::Persistence(BackendError::UniqueViolation { .. })) => {
                Err(already_exists(email))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Whether the email belongs to a user whose password matches.
    ///
    /// Unknown users, wrong passwords, and store failures are all `false`.
    pub fn valid_login(&self, email: &str, password: &str) -> bool {
        match self.store.find_by([("email", email)]) {
            Ok(user) => self.hasher.verify(password, &user.hashed_password),
            Err(err) => {
                if !err.is_not_found() {
                    debug!(error = %err, "login lookup failed");
                }
                false
            }
        }
    }

    /// Issue a fresh reset token for the user with this email.
    pub fn reset_password_token(&self, email: &str) -> Result<String> {
        let user = self.store.find_by([("email", email)])?;
        let token = Uuid::new_v4().to_string();
        self.store
            .update_by_id(user.id, [("reset_token", token.as_str())])?;
        debug!(user_id = %user.id, "reset token issued");
        Ok(token)
    }

    /// Replace the password of the user holding `reset_token` and clear the
    /// token.
    ///
    /// The token check and the write happen in one store transaction, so a
    /// token is accepted at most once even under concurrent use.
    pub fn update_password(&self, reset_token: &str, password: &str) -> Result<()> {
        let hash = self.hasher.hash(password)?;
        let holder = Predicate::default().and(UserAttribute::ResetToken, reset_token);
        let user = match self.store.update_where(
            &holder,
            [
                ("hashed_password", AttributeValue::from(hash)),
                ("reset_token", AttributeValue::Null),
            ],
        ) {
            Ok(user) => user,
            Err(err) if err.is_not_found() => return Err(AuthError::InvalidResetToken),
            Err(err) => return Err(err.into()),
        };
        info!(user_id = %user.id, "password updated");
        Ok(())
    }
}

fn already_exists(email: &str) -> AuthError {
    AuthError::UserAlreadyExists {
        email: email.to_string(),
    }
}
