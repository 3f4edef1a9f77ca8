//! CLI command implementations.

pub mod migrate;
pub mod user;

use secrecy::SecretString;

/// Errors shared by the commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Invalid command-line input.
    #[error("Invalid {0}: {1}")]
    InvalidInput(&'static str, String),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] sejuk_web::db::RepositoryError),

    /// Account creation was rejected.
    #[error("Account error: {0}")]
    Auth(#[from] sejuk_web::services::auth::AuthError),
}

/// Database URL from `SEJUK_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("SEJUK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SEJUK_DATABASE_URL"))
}
