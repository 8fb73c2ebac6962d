use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::{
    config::AppConfig,
    error::AppError,
    store::{DocumentStore, InMemoryDocumentStore, SqliteDocumentStore, StoreError},
};

pub type DbPool = SqlitePool;

pub const MEMORY_URL_SCHEME: &str = "memory://";

pub async fn init_pool(database_url: &str) -> Result<DbPool, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(StoreError::from)?;
    Ok(pool)
}

/// Opens the document store named by the config and brings its schema up to date.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, AppError> {
    let url = config.connection_url();
    if url.starts_with(MEMORY_URL_SCHEME) {
        info!("using in-memory document store");
        return Ok(Arc::new(InMemoryDocumentStore::new()));
    }

    let store = SqliteDocumentStore::new(init_pool(&url).await?);
    store.migrate().await?;
    info!(database = config.database_name(), "sqlite document store ready");
    Ok(Arc::new(store))
}
