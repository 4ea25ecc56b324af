use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/shopsync-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &shopsync_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

/// Catalog store failure taxonomy. Business-rule violations get their own
/// variants so the HTTP layer can map them to client errors without string
/// matching.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error("SKU already exists")]
    DuplicateSku,
    #[error("product has order items and cannot be deleted")]
    HasReferences,
    #[error("product does not manage stock")]
    StockNotManaged,
    #[error("stock quantity cannot go negative")]
    NegativeStock,
    #[error("sale_price must be strictly less than price")]
    SalePriceNotBelow,
    #[error("stock_quantity is required when manage_stock is enabled")]
    MissingStockQuantity,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// True for errors a caller caused: bad input or a business-rule
    /// violation, as opposed to infrastructure failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DbError::DuplicateSku
                | DbError::HasReferences
                | DbError::StockNotManaged
                | DbError::NegativeStock
                | DbError::SalePriceNotBelow
                | DbError::MissingStockQuantity
        )
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect to a Postgres pool, reading `DATABASE_URL` from env.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if `DATABASE_URL` is unset, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_env() -> Result<PgPool, DbError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbError::MissingDatabaseUrl)?;
    connect_pool(&database_url, PoolConfig::default())
        .await
        .map_err(DbError::from)
}

/// Run all pending migrations against the pool.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}


pub mod categories;
pub mod products;
pub mod sync_tasks;

pub use categories::{
    category_woo_ids_for_product, create_category, find_category, set_product_categories,
    CategoryRow,
};
pub use products::{
    create_product, exists_by_sku, featured_products, find_product, find_product_by_sku,
    find_product_by_woo_id, generate_unique_sku, list_products, low_stock_products, mutate_stock,
    set_woo_id, soft_delete_product, update_product, NewProduct, ProductFilters, ProductPage,
    ProductPatch, ProductRow, SortBy, SortDirection,
};
pub use sync_tasks::{
    complete_sync_task, enqueue_sync_task, fail_sync_task, find_sync_task, next_sync_task,
    requeue_orphaned_tasks, retry_sync_task, SyncTaskRow,
};
