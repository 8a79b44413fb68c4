//! Database connection management

use std::sync::Arc;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    config::{DatabaseConfig, StoreBackend},
    error::{AppError, AppResult},
};

use super::{memory::MemoryStore, postgres::PgStore, run_migrations, store::JudgeStore};

/// Create a new database connection pool
pub async fn create_pool(config: &DatabaseConfig) -> AppResult<PgPool> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| AppError::Configuration("DATABASE_URL is not set".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;

    Ok(pool)
}

/// Test database connection
pub async fn test_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Open the configured store, running migrations for PostgreSQL
pub async fn open_store(config: &DatabaseConfig) -> AppResult<Arc<dyn JudgeStore>> {
    match config.backend {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = create_pool(config).await?;
            test_connection(&pool).await?;

            tracing::info!("Running database migrations...");
            run_migrations(&pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; nothing survives a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
