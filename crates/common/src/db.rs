use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// How long a dispatch waits for a free connection before the store call fails.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Open the PostgreSQL pool shared by the stores and the user service.
///
/// Every delivery job performs a preference lookup, so `max_connections`
/// should be at least `DISPATCH_CONCURRENCY` to keep workers from queueing.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "PostgreSQL pool ready");
    Ok(pool)
}

/// Apply the `users` and `notifications` schema from `migrations/`.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
