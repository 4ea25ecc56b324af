use sqlx::PgPool;

use shopsync_core::StockOperation;

use super::{find_product, ProductRow, PRODUCT_COLUMNS};
use crate::DbError;

/// Applies a stock mutation and recomputes `in_stock` in one statement.
///
/// The new quantity is computed inside the UPDATE with a `>= 0` guard in the
/// WHERE clause, so two racing subtractions validate against the current
/// balance rather than a stale read — at most one of two over-draining calls
/// can succeed. When the guarded update matches no row, a follow-up read
/// picks the right error; the guard itself never races.
///
/// # Errors
///
/// - [`DbError::NotFound`] if the product does not exist or is deleted.
/// - [`DbError::StockNotManaged`] if `manage_stock` is false.
/// - [`DbError::NegativeStock`] if the mutation would drop the quantity
///   below zero.
/// - [`DbError::Sqlx`] if a query fails.
pub async fn mutate_stock(
    pool: &PgPool,
    id: i64,
    quantity: i32,
    operation: StockOperation,
) -> Result<ProductRow, DbError> {
    let new_quantity = match operation {
        StockOperation::Set => "$2",
        StockOperation::Add => "stock_quantity + $2",
        StockOperation::Subtract => "stock_quantity - $2",
    };

    let sql = format!(
        "UPDATE products \
         SET stock_quantity = {new_quantity}, \
             in_stock = ({new_quantity}) > 0, \
             updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL AND manage_stock \
           AND stock_quantity IS NOT NULL \
           AND ({new_quantity}) >= 0 \
         RETURNING {PRODUCT_COLUMNS}"
    );

    let updated = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .bind(quantity)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = updated {
        return Ok(row);
    }

    match find_product(pool, id).await? {
        None => Err(DbError::NotFound),
        Some(p) if !p.manage_stock => Err(DbError::StockNotManaged),
        Some(_) => Err(DbError::NegativeStock),
    }
}
