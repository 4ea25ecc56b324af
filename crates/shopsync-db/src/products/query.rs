use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{ProductRow, PRODUCT_COLUMNS};
use crate::DbError;
use shopsync_core::ProductStatus;

const DEFAULT_PER_PAGE: u32 = 15;
const MAX_PER_PAGE: u32 = 100;

/// Sortable columns. Anything outside this set falls back to `Name`, which
/// is what keeps arbitrary field injection out of the ORDER BY clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    Name,
    Price,
    CreatedAt,
    StockQuantity,
}

impl SortBy {
    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "price" => SortBy::Price,
            "created_at" => SortBy::CreatedAt,
            "stock_quantity" => SortBy::StockQuantity,
            _ => SortBy::Name,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortBy::Name => "name",
            SortBy::Price => "price",
            SortBy::CreatedAt => "created_at",
            SortBy::StockQuantity => "stock_quantity",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Composable listing filters. All predicates AND together; the `search`
/// term alone expands to an OR over name/description/SKU.
#[derive(Debug, Clone)]
pub struct ProductFilters {
    /// Exact status match; `None` scopes to published products.
    pub status: Option<ProductStatus>,
    pub category_id: Option<i64>,
    /// `Some(true)` applies the availability scope; `Some(false)` is a no-op,
    /// mirroring the truthy-only semantics of the original filter.
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
    pub sort_by: SortBy,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub per_page: u32,
}

impl Default for ProductFilters {
    fn default() -> Self {
        Self {
            status: None,
            category_id: None,
            in_stock: None,
            featured: None,
            price_min: None,
            price_max: None,
            search: None,
            sort_by: SortBy::default(),
            sort_direction: SortDirection::default(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// One page of filtered products plus pagination metadata.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductRow>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
}

/// Runs the filtered, sorted, paginated listing.
///
/// `per_page` is clamped to `1..=100` and `page` to at least 1. Soft-deleted
/// rows never appear.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either the page or the count query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: &ProductFilters,
) -> Result<ProductPage, DbError> {
    let per_page = filters.per_page.clamp(1, MAX_PER_PAGE);
    let page = filters.page.max(1);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let mut count_query: QueryBuilder<'_, Postgres> =
        QueryBuilder::new("SELECT COUNT(*) FROM products p WHERE p.deleted_at IS NULL");
    push_filters(&mut count_query, filters);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut page_query: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
        "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.deleted_at IS NULL"
    ));
    push_filters(&mut page_query, filters);
    // column() and keyword() come from fixed enums, never from caller input.
    page_query.push(format!(
        " ORDER BY p.{} {} NULLS LAST, p.id ASC",
        filters.sort_by.column(),
        filters.sort_direction.keyword()
    ));
    page_query.push(" LIMIT ");
    page_query.push_bind(i64::from(per_page));
    page_query.push(" OFFSET ");
    page_query.push_bind(offset);

    let items = page_query
        .build_query_as::<ProductRow>()
        .fetch_all(pool)
        .await?;

    let last_page = u32::try_from(total.max(0).unsigned_abs().div_ceil(u64::from(per_page)))
        .unwrap_or(u32::MAX)
        .max(1);

    Ok(ProductPage {
        items,
        page,
        per_page,
        total,
        last_page,
    })
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filters: &'a ProductFilters) {
    match filters.status {
        Some(status) => {
            qb.push(" AND p.status = ");
            qb.push_bind(status.as_str());
        }
        None => {
            qb.push(" AND p.status = 'publish'");
        }
    }

    if let Some(category_id) = filters.category_id {
        qb.push(
            " AND EXISTS (SELECT 1 FROM product_categories pc \
               WHERE pc.product_id = p.id AND pc.category_id = ",
        );
        qb.push_bind(category_id);
        qb.push(")");
    }

    if filters.in_stock == Some(true) {
        qb.push(" AND p.in_stock AND (NOT p.manage_stock OR p.stock_quantity > 0)");
    }

    if let Some(featured) = filters.featured {
        qb.push(" AND p.featured = ");
        qb.push_bind(featured);
    }

    if let Some(min) = filters.price_min {
        qb.push(" AND p.price >= ");
        qb.push_bind(min);
    }

    if let Some(max) = filters.price_max {
        qb.push(" AND p.price <= ");
        qb.push_bind(max);
    }

    if let Some(term) = filters.search.as_deref() {
        let pattern = format!("%{term}%");
        qb.push(" AND (p.name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.description ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.sku ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_by_falls_back_to_name_for_unknown_columns() {
        assert_eq!(SortBy::parse_lossy("price"), SortBy::Price);
        assert_eq!(SortBy::parse_lossy("id; DROP TABLE products"), SortBy::Name);
        assert_eq!(SortBy::parse_lossy(""), SortBy::Name);
    }

    #[test]
    fn sort_direction_defaults_to_ascending() {
        assert_eq!(SortDirection::parse_lossy("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::parse_lossy("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::parse_lossy("sideways"), SortDirection::Asc);
    }

    #[test]
    fn default_filters_paginate_from_page_one() {
        let f = ProductFilters::default();
        assert_eq!(f.page, 1);
        assert_eq!(f.per_page, DEFAULT_PER_PAGE);
        assert!(f.status.is_none());
    }
}
