//! Catalog store operations for the `products` table.
//!
//! Split by concern: row/input types, reads, writes, the atomic stock
//! mutation, and the filtered listing query. All operations exclude
//! soft-deleted rows.

mod query;
mod read;
mod stock;
mod types;
mod write;

pub use query::{list_products, ProductFilters, ProductPage, SortBy, SortDirection};
pub use read::{
    exists_by_sku, featured_products, find_product, find_product_by_sku, find_product_by_woo_id,
    low_stock_products,
};
pub use stock::mutate_stock;
pub use types::{NewProduct, ProductPatch, ProductRow};
pub use write::{
    create_product, generate_unique_sku, set_woo_id, soft_delete_product, update_product,
};

/// Column list shared by every SELECT/RETURNING against `products`, so row
/// decoding stays in one shape.
pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, short_description, sku, price, \
     sale_price, stock_quantity, manage_stock, in_stock, weight, dimensions, status, featured, \
     catalog_visibility, meta_data, images, woo_id, created_at, updated_at, deleted_at";

use crate::DbError;
use rust_decimal::Decimal;

/// Validates the cross-field invariants every write must satisfy.
pub(crate) fn check_invariants(
    price: Decimal,
    sale_price: Option<Decimal>,
    manage_stock: bool,
    stock_quantity: Option<i32>,
) -> Result<(), DbError> {
    if let Some(sale) = sale_price {
        if sale >= price {
            return Err(DbError::SalePriceNotBelow);
        }
    }
    if manage_stock {
        match stock_quantity {
            None => return Err(DbError::MissingStockQuantity),
            Some(q) if q < 0 => return Err(DbError::NegativeStock),
            Some(_) => {}
        }
    }
    Ok(())
}

/// Maps a unique violation on the live-SKU index to [`DbError::DuplicateSku`];
/// everything else passes through.
pub(crate) fn map_sku_violation(e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some("23505")
            && db_err
                .constraint()
                .is_some_and(|c| c.contains("sku"))
        {
            return DbError::DuplicateSku;
        }
    }
    DbError::Sqlx(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn sale_price_must_be_strictly_below_price() {
        assert!(matches!(
            check_invariants(dec("10.00"), Some(dec("10.00")), false, None),
            Err(DbError::SalePriceNotBelow)
        ));
        assert!(matches!(
            check_invariants(dec("10.00"), Some(dec("12.00")), false, None),
            Err(DbError::SalePriceNotBelow)
        ));
        assert!(check_invariants(dec("10.00"), Some(dec("9.99")), false, None).is_ok());
        assert!(check_invariants(dec("10.00"), None, false, None).is_ok());
    }

    #[test]
    fn managed_stock_requires_a_quantity() {
        assert!(matches!(
            check_invariants(dec("5.00"), None, true, None),
            Err(DbError::MissingStockQuantity)
        ));
        assert!(matches!(
            check_invariants(dec("5.00"), None, true, Some(-1)),
            Err(DbError::NegativeStock)
        ));
        assert!(check_invariants(dec("5.00"), None, true, Some(0)).is_ok());
    }

    #[test]
    fn unmanaged_stock_ignores_quantity() {
        assert!(check_invariants(dec("5.00"), None, false, None).is_ok());
        assert!(check_invariants(dec("5.00"), None, false, Some(7)).is_ok());
    }
}
