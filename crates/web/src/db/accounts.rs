//! Account repository for credential storage.

use async_trait::async_trait;
use sqlx::PgPool;

use sejuk_core::{AccountId, Email};

use super::{AccountStore, RepositoryError, StoredAccount, conflict_on_unique};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i32,
    email: String,
    password_hash: String,
}

impl TryFrom<AccountRow> for StoredAccount {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: AccountId::new(row.id),
            email,
            password_hash: row.password_hash,
        })
    }
}

/// Repository for account database operations.
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<AccountId, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO sejuk.account (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        Ok(AccountId::new(id))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<StoredAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, email, password_hash
            FROM sejuk.account
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoredAccount::try_from).transpose()
    }
}
