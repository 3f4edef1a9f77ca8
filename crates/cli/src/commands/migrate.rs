//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! sejuk-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SEJUK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Schema migrations live in `crates/web/migrations/`; the session table is
//! created by the session store itself.

use tower_sessions_sqlx_store::PostgresStore;

use super::{CommandError, database_url};

/// Run the schema and session-store migrations.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = sejuk_web::db::create_pool(&database_url).await?;

    tracing::info!("Running schema migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
