/// Schema migrations
///
/// SQL files under `migrations/` at the workspace root are compiled into the
/// binary, so the server brings an empty database up to date on start.

use sqlx::{migrate::MigrateDatabase, migrate::MigrateError, migrate::Migrator, postgres::PgPool, Postgres};
use tracing::{error, info};

pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// What the database has applied compared to what the binary carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied: usize,
    pub newest_applied: Option<i64>,
    pub embedded: usize,
}

impl MigrationStatus {
    pub fn pending(&self) -> usize {
        self.embedded.saturating_sub(self.applied)
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending() == 0
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let embedded = MIGRATOR.iter().count();

    if let Err(e) = MIGRATOR.run(pool).await {
        error!(error = %e, embedded, "Schema migration failed");
        return Err(e);
    }

    info!(embedded, "Schema up to date");
    Ok(())
}

/// Counts successful rows in `_sqlx_migrations`; a missing table counts as none
pub async fn migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let embedded = MIGRATOR.iter().count();

    let tracked: bool = sqlx::query_scalar("SELECT to_regclass('public._sqlx_migrations') IS NOT NULL")
        .fetch_one(pool)
        .await?;

    let (applied, newest_applied) = if tracked {
        sqlx::query_as::<_, (i64, Option<i64>)>(
            "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success",
        )
        .fetch_one(pool)
        .await?
    } else {
        (0, None)
    };

    Ok(MigrationStatus {
        applied: usize::try_from(applied).unwrap_or(0),
        newest_applied,
        embedded,
    })
}

/// Creates the database in `database_url` when absent; used by local setups and tests
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        return Ok(());
    }

    info!("Creating missing database");
    Postgres::create_database(database_url).await
}
