//! Database setup and initialization

use anyhow::{Context, Result};
use lingua_core::Config;
use lingua_db::{PgStore, MIGRATOR};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Open the connection pool described by the configuration
pub async fn connect(config: &Config) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );
    Ok(pool)
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Connect, migrate and wrap the pool in the PostgreSQL store
pub async fn setup_store(config: &Config) -> Result<PgStore> {
    let pool = connect(config).await?;
    run_migrations(&pool).await?;
    Ok(PgStore::new(pool))
}
