use sqlx::PgPool;

use super::{ProductRow, PRODUCT_COLUMNS};
use crate::DbError;

/// Looks a product up by internal id. Absence is a valid result, not an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Looks a product up by (already normalized) SKU.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_by_sku(pool: &PgPool, sku: &str) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1 AND deleted_at IS NULL"
    ))
    .bind(sku)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Looks a product up by its remote platform identifier.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_product_by_woo_id(
    pool: &PgPool,
    woo_id: i64,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE woo_id = $1 AND deleted_at IS NULL"
    ))
    .bind(woo_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Whether a live (non-deleted) product already carries this SKU.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn exists_by_sku(pool: &PgPool, sku: &str) -> Result<bool, DbError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1 AND deleted_at IS NULL)",
    )
    .bind(sku)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Featured products that are published and currently sellable.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn featured_products(pool: &PgPool, limit: i64) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE deleted_at IS NULL AND featured AND status = 'publish' \
           AND in_stock AND (NOT manage_stock OR stock_quantity > 0) \
         ORDER BY name ASC, id ASC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Published products with managed stock at or below `threshold` (but not
/// yet exhausted) — the restock worklist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn low_stock_products(
    pool: &PgPool,
    threshold: i32,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE deleted_at IS NULL AND status = 'publish' AND manage_stock \
           AND stock_quantity > 0 AND stock_quantity <= $1 \
         ORDER BY stock_quantity ASC, id ASC"
    ))
    .bind(threshold)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
