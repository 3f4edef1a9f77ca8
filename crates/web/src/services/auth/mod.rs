//! Identity gateway.
//!
//! Email and password sign-up / sign-in over an [`AccountStore`], with
//! Argon2id password hashes. The session itself is the HTTP session; this
//! module only answers "who is this".

mod error;

pub use error::AuthError;

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;

use sejuk_core::{AccountId, Email};

use crate::db::{AccountStore, RepositoryError};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: AccountId,
    pub email: Email,
}

/// Authentication provider seam.
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Create an account and return its identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`, or
    /// `AuthError::EmailAlreadyInUse` for bad input.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Check a credential pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password, and `AuthError::InvalidEmail` for malformed input.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
}

/// Password-based gateway over an account store.
pub struct PasswordGateway {
    accounts: Arc<dyn AccountStore>,
    hasher: Argon2<'static>,
}

impl PasswordGateway {
    /// Create a gateway using the default Argon2id parameters.
    #[must_use]
    pub fn new(accounts: Arc<dyn AccountStore>) -> Self {
        Self::with_hasher(accounts, Argon2::default())
    }

    /// Create a gateway with explicit hashing parameters.
    #[must_use]
    pub fn with_hasher(accounts: Arc<dyn AccountStore>, hasher: Argon2<'static>) -> Self {
        Self { accounts, hasher }
    }
}

#[async_trait]
impl IdentityGateway for PasswordGateway {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(&self.hasher, password)?;

        let id = self
            .accounts
            .create(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailAlreadyInUse,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(account_id = %id, "Account created");
        Ok(Identity { id, email })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Email::parse(email)?;

        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&self.hasher, password, &account.password_hash)?;

        Ok(Identity {
            id: account.id,
            email: account.email,
        })
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(hasher: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(hasher: &Argon2<'_>, password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    hasher
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
