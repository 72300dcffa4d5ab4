/// Schema migrations and the server-start ledger
///
/// Migrations live in `othello-shared/migrations/` and are embedded into the
/// binary by `sqlx::migrate!`, so a deployed server carries its own schema.
///
/// # Example
///
/// ```no_run
/// use othello_shared::db::migrations::{record_server_start, run_migrations};
/// use othello_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?)).await?;
/// run_migrations(&pool).await?;
/// record_server_start(&pool).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use tracing::{info, warn};

/// Applies every pending migration
///
/// Each migration runs in its own transaction; a failing one is rolled
/// back and reported.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("Database schema is up to date");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Appends a row to `server_starts` and returns its timestamp
pub async fn record_server_start(pool: &PgPool) -> Result<DateTime<Utc>, sqlx::Error> {
    let started_at: DateTime<Utc> =
        sqlx::query_scalar("INSERT INTO server_starts (started_at) VALUES (NOW()) RETURNING started_at")
            .fetch_one(pool)
            .await?;

    info!(%started_at, "Recorded server start");
    Ok(started_at)
}

/// Number of recorded server starts
pub async fn count_server_starts(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM server_starts")
        .fetch_one(pool)
        .await
}
