//! User provisioning commands.
//!
//! # Usage
//!
//! ```bash
//! SEJUK_NEW_USER_PASSWORD=... sejuk-cli user create -e ali@sejuk.my -u ali -r technician
//! ```
//!
//! # Environment Variables
//!
//! - `SEJUK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `SEJUK_NEW_USER_PASSWORD` - Password for the new account

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use sejuk_core::{AccountId, Role, Username};
use sejuk_web::db::{AccountRepository, DirectoryStore, ProfileRepository};
use sejuk_web::models::NewProfile;
use sejuk_web::services::auth::{IdentityGateway, PasswordGateway};

use super::{CommandError, database_url};

const PASSWORD_VAR: &str = "SEJUK_NEW_USER_PASSWORD";

/// Create an account and its directory profile.
///
/// # Arguments
///
/// * `email` - Sign-in email
/// * `username` - Directory username (orders are assigned by it)
/// * `role` - `admin` or `technician`
///
/// # Errors
///
/// Returns `CommandError` for bad input, a taken email or username, or
/// database failures.
pub async fn create(email: &str, username: &str, role: &str) -> Result<AccountId, CommandError> {
    let role: Role = role
        .parse()
        .map_err(|_| CommandError::InvalidInput("role", role.to_owned()))?;
    let username = Username::parse(username)
        .map_err(|e| CommandError::InvalidInput("username", e.to_string()))?;
    let password = std::env::var(PASSWORD_VAR)
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar(PASSWORD_VAR))?;

    let pool = sejuk_web::db::create_pool(&database_url()?).await?;
    let gateway = PasswordGateway::new(Arc::new(AccountRepository::new(pool.clone())));
    let profiles = ProfileRepository::new(pool);

    if profiles.username_taken(&username).await? {
        return Err(CommandError::InvalidInput(
            "username",
            format!("{username} is already taken"),
        ));
    }

    tracing::info!("Creating {} account: {}", role, email);
    let identity = gateway.sign_up(email, password.expose_secret()).await?;

    profiles
        .create(&NewProfile {
            account_id: identity.id,
            email: identity.email,
            username,
            role,
        })
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        identity.id,
        email,
        role
    );
    Ok(identity.id)
}
