//! Product read handlers: listing, featured shelf, single lookup.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use shopsync_core::ProductStatus;
use shopsync_db::{ProductFilters, ProductRow, SortBy, SortDirection};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub sku: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub effective_price: Decimal,
    pub stock_quantity: Option<i32>,
    pub manage_stock: bool,
    pub in_stock: bool,
    pub weight: Option<Decimal>,
    pub dimensions: Option<serde_json::Value>,
    pub status: String,
    pub featured: bool,
    pub catalog_visibility: String,
    pub meta_data: serde_json::Value,
    pub images: serde_json::Value,
    pub woo_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        let effective_price = row.effective_price();
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            short_description: row.short_description,
            sku: row.sku,
            price: row.price,
            sale_price: row.sale_price,
            effective_price,
            stock_quantity: row.stock_quantity,
            manage_stock: row.manage_stock,
            in_stock: row.in_stock,
            weight: row.weight,
            dimensions: row.dimensions,
            status: row.status,
            featured: row.featured,
            catalog_visibility: row.catalog_visibility,
            meta_data: row.meta_data,
            images: row.images,
            woo_id: row.woo_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductListData {
    pub items: Vec<ProductItem>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListQuery {
    pub status: Option<String>,
    pub category_id: Option<i64>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub(super) fn filters_from_query(req_id: &str, query: &ListQuery) -> Result<ProductFilters, ApiError> {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(ProductStatus::parse_strict(raw).ok_or_else(|| {
            ApiError::new(
                req_id,
                "validation_error",
                format!("unknown status '{raw}'"),
            )
        })?),
    };

    let defaults = ProductFilters::default();
    Ok(ProductFilters {
        status,
        category_id: query.category_id,
        in_stock: query.in_stock,
        featured: query.featured,
        price_min: query.price_min,
        price_max: query.price_max,
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
        sort_by: query
            .sort_by
            .as_deref()
            .map_or(SortBy::default(), SortBy::parse_lossy),
        sort_direction: query
            .sort_direction
            .as_deref()
            .map_or(SortDirection::default(), SortDirection::parse_lossy),
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    })
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ProductListData>>, ApiError> {
    let filters = filters_from_query(&req_id.0, &query)?;
    let page = shopsync_db::list_products(&state.pool, &filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductListData {
            items: page.items.into_iter().map(ProductItem::from).collect(),
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            last_page: page.last_page,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct FeaturedQuery {
    pub limit: Option<i64>,
}

pub(super) async fn featured_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FeaturedQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let rows = shopsync_db::featured_products(&state.pool, limit)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProductItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let row = shopsync_db::find_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "product not found"))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
