use sqlx::PgPool;

use shopsync_core::{normalize_sku, sku_base, sku_candidate};

use super::{
    check_invariants, find_product, map_sku_violation, NewProduct, ProductPatch, ProductRow,
    PRODUCT_COLUMNS,
};
use crate::DbError;

/// Inserts a new product.
///
/// SKUs are uppercase-normalized; a missing SKU is generated from the name.
/// Stock quantity is nulled out when `manage_stock` is false.
///
/// # Errors
///
/// - [`DbError::DuplicateSku`] if the SKU is already taken by a live row.
/// - [`DbError::SalePriceNotBelow`], [`DbError::MissingStockQuantity`],
///   [`DbError::NegativeStock`] on invariant violations.
/// - [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(pool: &PgPool, new: &NewProduct) -> Result<ProductRow, DbError> {
    check_invariants(new.price, new.sale_price, new.manage_stock, new.stock_quantity)?;

    let sku = match new.sku.as_deref() {
        Some(s) if !s.trim().is_empty() => normalize_sku(s),
        _ => generate_unique_sku(pool, &new.name).await?,
    };
    let stock_quantity = if new.manage_stock {
        new.stock_quantity
    } else {
        None
    };
    let dimensions = dimensions_json(new.dimensions.as_ref());
    let images = serde_json::to_value(&new.images).unwrap_or_default();

    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
             (name, description, short_description, sku, price, sale_price, stock_quantity, \
              manage_stock, in_stock, weight, dimensions, status, featured, catalog_visibility, \
              meta_data, images, woo_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.short_description)
    .bind(&sku)
    .bind(new.price)
    .bind(new.sale_price)
    .bind(stock_quantity)
    .bind(new.manage_stock)
    .bind(new.in_stock)
    .bind(new.weight)
    .bind(dimensions)
    .bind(new.status.as_str())
    .bind(new.featured)
    .bind(new.catalog_visibility.as_str())
    .bind(&new.meta_data)
    .bind(images)
    .bind(new.woo_id)
    .fetch_one(pool)
    .await
    .map_err(map_sku_violation)?;

    Ok(row)
}

/// Sparse-merges `patch` onto the current row and writes the result back.
///
/// SKU uniqueness is re-enforced by the live-SKU index, so it only bites when
/// the SKU actually changed. Cross-field invariants are validated against the
/// merged values.
///
/// # Errors
///
/// - [`DbError::NotFound`] if the product does not exist or is deleted.
/// - [`DbError::DuplicateSku`] / invariant variants as for create.
/// - [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    patch: &ProductPatch,
) -> Result<ProductRow, DbError> {
    let current = find_product(pool, id).await?.ok_or(DbError::NotFound)?;

    let price = patch.price.unwrap_or(current.price);
    let sale_price = patch.sale_price.unwrap_or(current.sale_price);
    let manage_stock = patch.manage_stock.unwrap_or(current.manage_stock);
    let stock_quantity = patch.stock_quantity.unwrap_or(current.stock_quantity);
    check_invariants(price, sale_price, manage_stock, stock_quantity)?;
    let stock_quantity = if manage_stock { stock_quantity } else { None };

    let sku = patch
        .sku
        .as_deref()
        .map_or_else(|| current.sku.clone(), normalize_sku);
    let dimensions = match &patch.dimensions {
        Some(d) => dimensions_json(d.as_ref()),
        None => current.dimensions.clone(),
    };
    let images = match &patch.images {
        Some(list) => serde_json::to_value(list).unwrap_or_default(),
        None => current.images.clone(),
    };

    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products SET \
             name = $2, description = $3, short_description = $4, sku = $5, price = $6, \
             sale_price = $7, stock_quantity = $8, manage_stock = $9, in_stock = $10, \
             weight = $11, dimensions = $12, status = $13, featured = $14, \
             catalog_visibility = $15, meta_data = $16, images = $17, updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.name.as_deref().unwrap_or(&current.name))
    .bind(patch.description.as_deref().unwrap_or(&current.description))
    .bind(
        patch
            .short_description
            .as_deref()
            .unwrap_or(&current.short_description),
    )
    .bind(&sku)
    .bind(price)
    .bind(sale_price)
    .bind(stock_quantity)
    .bind(manage_stock)
    .bind(patch.in_stock.unwrap_or(current.in_stock))
    .bind(patch.weight.unwrap_or(current.weight))
    .bind(dimensions)
    .bind(
        patch
            .status
            .map_or_else(|| current.status.clone(), |s| s.as_str().to_string()),
    )
    .bind(patch.featured.unwrap_or(current.featured))
    .bind(patch.catalog_visibility.map_or_else(
        || current.catalog_visibility.clone(),
        |v| v.as_str().to_string(),
    ))
    .bind(patch.meta_data.as_ref().unwrap_or(&current.meta_data))
    .bind(images)
    .fetch_optional(pool)
    .await
    .map_err(map_sku_violation)?;

    row.ok_or(DbError::NotFound)
}

/// Records the remote identifier returned by the platform's create call.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product vanished in the meantime, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_woo_id(pool: &PgPool, id: i64, woo_id: i64) -> Result<(), DbError> {
    let affected = sqlx::query(
        "UPDATE products SET woo_id = $2, updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(woo_id)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Soft-deletes a product, refusing while order items still reference it.
///
/// # Errors
///
/// - [`DbError::NotFound`] if the product does not exist or is already deleted.
/// - [`DbError::HasReferences`] if any order item points at it.
/// - [`DbError::Sqlx`] if a query fails.
pub async fn soft_delete_product(pool: &PgPool, id: i64) -> Result<(), DbError> {
    if find_product(pool, id).await?.is_none() {
        return Err(DbError::NotFound);
    }

    let referenced: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM order_items WHERE product_id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if referenced {
        return Err(DbError::HasReferences);
    }

    let affected = sqlx::query(
        "UPDATE products SET deleted_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Derives a SKU from the product name and suffixes a counter until it no
/// longer collides with a live row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the existence probe fails.
pub async fn generate_unique_sku(pool: &PgPool, name: &str) -> Result<String, DbError> {
    let base = sku_base(name);
    let mut counter = 1u32;
    loop {
        let candidate = sku_candidate(&base, counter);
        if !super::exists_by_sku(pool, &candidate).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

fn dimensions_json(dimensions: Option<&shopsync_core::Dimensions>) -> Option<serde_json::Value> {
    dimensions
        .filter(|d| !d.is_empty())
        .and_then(|d| serde_json::to_value(d).ok())
}
