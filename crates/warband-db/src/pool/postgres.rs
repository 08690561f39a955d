//! Postgres pool construction

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use warband_common::DatabaseConfig;

pub use sqlx::PgPool;

// Connection recycling knobs not exposed through configuration.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Open a connection pool from the database section of the app config
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect(&config.url)
        .await?;

    info!(
        min = config.min_connections,
        max = config.max_connections,
        "Database pool ready"
    );

    Ok(pool)
}

/// Open a pool from `DATABASE_URL` alone, with default sizing
///
/// Convenience path for tools and tests that bypass the layered config.
pub async fn create_pool_from_env() -> Result<PgPool, sqlx::Error> {
    let url = std::env::var("DATABASE_URL")
        .map_err(|e| sqlx::Error::Configuration(Box::new(e)))?;
    create_pool(&DatabaseConfig {
        url,
        max_connections: 5,
        min_connections: 1,
    })
    .await
}
