//! Persistence for accounts, profiles, and service orders.
//!
//! # Database: `sejuk`
//!
//! ## Tables
//!
//! - `account` - Credentials checked by the identity gateway
//! - `profile` - Directory entry per account (username, role)
//! - `service_order` - Orders and their completion details
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! Each store is a trait so the workflows can run against `PostgreSQL` in
//! production and against [`memory`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p sejuk-cli -- migrate
//! ```

pub mod accounts;
pub mod memory;
pub mod orders;
pub mod profiles;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use sejuk_core::{AccountId, Email, OrderId, Role, Username};

use crate::models::{Completion, NewOrder, NewProfile, Order, Profile};

pub use accounts::AccountRepository;
pub use orders::OrderRepository;
pub use profiles::ProfileRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, order already completed).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The backing store is unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A value does not fit its column.
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

/// A stored credential row.
#[derive(Debug, Clone)]
pub struct StoredAccount {
    pub id: AccountId,
    pub email: Email,
    pub password_hash: String,
}

/// Credential storage behind the identity gateway.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, email: &Email, password_hash: &str)
    -> Result<AccountId, RepositoryError>;

    /// Look up an account by email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<StoredAccount>, RepositoryError>;
}

/// Profile directory keyed by account.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetch the profile for an account.
    async fn get(&self, id: AccountId) -> Result<Option<Profile>, RepositoryError>;

    /// Write the profile for a freshly created account.
    ///
    /// Returns `RepositoryError::Conflict` if the account already has a
    /// profile or the username is taken.
    async fn create(&self, profile: &NewProfile) -> Result<Profile, RepositoryError>;

    /// Whether any profile already uses `username`.
    async fn username_taken(&self, username: &Username) -> Result<bool, RepositoryError>;

    /// Every profile carrying `role`.
    async fn list_by_role(&self, role: Role) -> Result<Vec<Profile>, RepositoryError>;
}

/// Service order storage.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new `Pending` order and return its id.
    async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError>;

    /// Apply the completion transition.
    ///
    /// Only a `Pending` order can be completed. Returns
    /// `RepositoryError::NotFound` for an unknown id and
    /// `RepositoryError::Conflict` if the order is already done.
    async fn complete(&self, id: OrderId, completion: &Completion) -> Result<(), RepositoryError>;

    /// Every order assigned to `technician`, whatever its status.
    async fn list_for_technician(&self, technician: &Username)
    -> Result<Vec<Order>, RepositoryError>;

    /// Fetch one order.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Cheap connectivity probe for the readiness endpoint.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Reject completion amounts the `NUMERIC(12,2)` columns cannot hold.
fn check_completion_amounts(completion: &Completion) -> Result<(), RepositoryError> {
    for (column, amount) in [
        ("extra_charges", completion.extra_charges),
        ("final_amount", completion.final_amount),
    ] {
        if !amount.is_storable() {
            return Err(RepositoryError::OutOfRange(format!("{column} = {amount}")));
        }
    }
    Ok(())
}

/// Map a unique-constraint violation to `Conflict`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
