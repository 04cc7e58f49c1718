use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Creates the SQLite connection pool, creating the database file if needed,
/// and applies the embedded migrations.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Opening SQLite database at {database_url}...");

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to apply database migrations")?;
    Ok(())
}

/// Single-connection in-memory database with the schema applied.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}
