//! Embedded schema migrations applied at startup.
//!
//! `diesel_migrations` drives a synchronous connection, so the run happens on
//! the blocking pool rather than on an async worker thread.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations from `backend/migrations`, compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Failure while bringing the schema up to date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// No connection for the migration run.
    #[error("failed to connect for migrations: {message}")]
    Connect {
        /// Underlying error message.
        message: String,
    },
    /// A migration failed.
    #[error("failed to apply migrations: {message}")]
    Apply {
        /// Underlying error message.
        message: String,
    },
    /// The blocking task panicked or was cancelled.
    #[error("migration task aborted: {message}")]
    Aborted {
        /// Underlying error message.
        message: String,
    },
}

/// Apply every pending migration, returning how many ran.
pub async fn run_pending_migrations(database_url: &str) -> Result<usize, MigrationError> {
    let database_url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || {
        let mut conn =
            PgConnection::establish(&database_url).map_err(|error| MigrationError::Connect {
                message: error.to_string(),
            })?;
        conn.run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.len())
            .map_err(|error| MigrationError::Apply {
                message: error.to_string(),
            })
    })
    .await
    .map_err(|error| MigrationError::Aborted {
        message: error.to_string(),
    })??;

    info!(applied, "database migrations complete");
    Ok(applied)
}
