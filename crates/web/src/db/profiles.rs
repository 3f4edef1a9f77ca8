//! Profile repository for the directory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sejuk_core::{AccountId, Email, Role, Username};

use super::{DirectoryStore, RepositoryError, conflict_on_unique};
use crate::models::{NewProfile, Profile};

#[derive(sqlx::FromRow)]
struct ProfileRow {
    account_id: AccountId,
    email: Option<String>,
    username: Option<String>,
    role: Role,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .filter(|e| !e.trim().is_empty())
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;
        // A blank username is treated the same as a missing one.
        let username = row.username.and_then(|u| Username::parse(&u).ok());

        Ok(Self {
            account_id: row.account_id,
            email,
            username,
            role: row.role,
            created_at: row.created_at,
        })
    }
}

/// Repository for profile database operations.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for ProfileRepository {
    async fn get(&self, id: AccountId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT account_id, email, username, role, created_at
            FROM sejuk.profile
            WHERE account_id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    async fn create(&self, profile: &NewProfile) -> Result<Profile, RepositoryError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"
            INSERT INTO sejuk.profile (account_id, email, username, role)
            VALUES ($1, $2, $3, $4)
            RETURNING account_id, email, username, role, created_at
            ",
        )
        .bind(profile.account_id)
        .bind(profile.email.as_str())
        .bind(profile.username.as_str())
        .bind(profile.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "profile"))?;

        Profile::try_from(row)
    }

    async fn username_taken(&self, username: &Username) -> Result<bool, RepositoryError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sejuk.profile WHERE username = $1)",
        )
        .bind(username.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Profile>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r"
            SELECT account_id, email, username, role, created_at
            FROM sejuk.profile
            WHERE role = $1
            ORDER BY username
            ",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Profile::try_from).collect()
    }
}
