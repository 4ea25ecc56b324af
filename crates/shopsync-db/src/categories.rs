//! Database operations for `categories` and the product membership join.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `categories` table. `parent_id` is NULL for top-level
/// categories; `woo_id` links to the remote platform's category record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub woo_id: Option<i64>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

const CATEGORY_COLUMNS: &str =
    "id, name, slug, parent_id, woo_id, display_order, created_at, updated_at, deleted_at";

/// Inserts a category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including slug collisions).
pub async fn create_category(
    pool: &PgPool,
    name: &str,
    slug: &str,
    parent_id: Option<i64>,
    woo_id: Option<i64>,
    display_order: i32,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "INSERT INTO categories (name, slug, parent_id, woo_id, display_order) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(name)
    .bind(slug)
    .bind(parent_id)
    .bind(woo_id)
    .bind(display_order)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Looks a category up by id. Absence is a valid result.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_category(pool: &PgPool, id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Replaces a product's category memberships in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is partially
/// applied.
pub async fn set_product_categories(
    pool: &PgPool,
    product_id: i64,
    category_ids: &[i64],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    for category_id in category_ids {
        sqlx::query(
            "INSERT INTO product_categories (product_id, category_id) \
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Remote category ids for a product's memberships. Categories that have
/// never been pushed (no `woo_id`) are simply absent from the result — the
/// outbound payload drops them rather than sending nulls.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn category_woo_ids_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<i64>, DbError> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT c.woo_id FROM categories c \
         JOIN product_categories pc ON pc.category_id = c.id \
         WHERE pc.product_id = $1 AND c.woo_id IS NOT NULL AND c.deleted_at IS NULL \
         ORDER BY c.display_order ASC, c.id ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
