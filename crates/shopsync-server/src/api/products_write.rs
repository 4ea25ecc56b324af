//! Product write handlers: create, update, delete, stock mutation.
//!
//! Money fields travel as JSON strings (`"19.99"`), matching the wire shape
//! the store uses. After a successful write, auto-sync enqueues an outbound
//! push; the HTTP response never waits on the push itself.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use shopsync_core::{CatalogVisibility, Dimensions, ProductImage, ProductStatus, StockOperation};
use shopsync_db::{NewProduct, ProductPatch};

use super::products::ProductItem;
use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub manage_stock: Option<bool>,
    pub in_stock: Option<bool>,
    pub weight: Option<Decimal>,
    pub dimensions: Option<Dimensions>,
    pub status: Option<String>,
    pub featured: Option<bool>,
    pub catalog_visibility: Option<String>,
    pub meta_data: Option<serde_json::Value>,
    pub images: Option<Vec<ProductImage>>,
    pub category_ids: Option<Vec<i64>>,
}

// Option<Option<T>> is intentional: outer None = "not in request" (keep current),
// Some(None) = "explicitly cleared", Some(Some(v)) = "set to value" (PATCH semantics).
#[allow(clippy::option_option)]
#[derive(Debug, Deserialize)]
pub(super) struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub sku: Option<String>,
    pub price: Option<Decimal>,
    pub sale_price: Option<Option<Decimal>>,
    pub stock_quantity: Option<Option<i32>>,
    pub manage_stock: Option<bool>,
    pub in_stock: Option<bool>,
    pub weight: Option<Option<Decimal>>,
    pub dimensions: Option<Option<Dimensions>>,
    pub status: Option<String>,
    pub featured: Option<bool>,
    pub catalog_visibility: Option<String>,
    pub meta_data: Option<serde_json::Value>,
    pub images: Option<Vec<ProductImage>>,
    pub category_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StockRequest {
    pub quantity: i32,
    pub operation: String,
}

#[derive(Debug, Serialize)]
pub(super) struct DeleteResponse {
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn parse_status(req_id: &str, value: Option<&str>) -> Result<Option<ProductStatus>, ApiError> {
    value
        .map(|raw| {
            ProductStatus::parse_strict(raw).ok_or_else(|| {
                ApiError::new(req_id, "validation_error", format!("unknown status '{raw}'"))
            })
        })
        .transpose()
}

fn parse_visibility(
    req_id: &str,
    value: Option<&str>,
) -> Result<Option<CatalogVisibility>, ApiError> {
    value
        .map(|raw| {
            CatalogVisibility::parse_strict(raw).ok_or_else(|| {
                ApiError::new(
                    req_id,
                    "validation_error",
                    format!("unknown catalog visibility '{raw}'"),
                )
            })
        })
        .transpose()
}

fn validate_name(req_id: &str, name: &str) -> Result<String, ApiError> {
    let name = name.trim().to_owned();
    if name.is_empty() || name.len() > 255 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be 1–255 characters",
        ));
    }
    Ok(name)
}

fn validate_price(req_id: &str, price: Decimal) -> Result<(), ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "price must not be negative",
        ));
    }
    Ok(())
}

/// Queues an outbound push when auto-sync is on. Enqueue failures are real
/// errors; push failures are not — they surface through the task queue.
async fn enqueue_if_auto(state: &AppState, req_id: &str, product_id: i64) -> Result<(), ApiError> {
    if state.auto_sync {
        shopsync_db::enqueue_sync_task(&state.pool, product_id)
            .await
            .map_err(|e| map_db_error(req_id.to_owned(), &e))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let rid = &req_id.0;

    let name = validate_name(rid, &body.name)?;
    validate_price(rid, body.price)?;
    let status = parse_status(rid, body.status.as_deref())?.unwrap_or(ProductStatus::Draft);
    let visibility =
        parse_visibility(rid, body.catalog_visibility.as_deref())?.unwrap_or(CatalogVisibility::Visible);

    let new = NewProduct {
        name,
        description: body.description.unwrap_or_default(),
        short_description: body.short_description.unwrap_or_default(),
        sku: body.sku,
        price: body.price,
        sale_price: body.sale_price,
        stock_quantity: body.stock_quantity,
        manage_stock: body.manage_stock.unwrap_or(false),
        in_stock: body.in_stock.unwrap_or(true),
        weight: body.weight,
        dimensions: body.dimensions,
        status,
        featured: body.featured.unwrap_or(false),
        catalog_visibility: visibility,
        meta_data: body.meta_data.unwrap_or_else(|| serde_json::Value::Array(vec![])),
        images: body.images.unwrap_or_default(),
        woo_id: None,
    };

    let row = shopsync_db::create_product(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    if let Some(category_ids) = &body.category_ids {
        shopsync_db::set_product_categories(&state.pool, row.id, category_ids)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;
    }
    enqueue_if_auto(&state, rid, row.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /api/v1/products/{id}
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;

    let name = body.name.as_deref().map(|n| validate_name(rid, n)).transpose()?;
    if let Some(price) = body.price {
        validate_price(rid, price)?;
    }
    let status = parse_status(rid, body.status.as_deref())?;
    let visibility = parse_visibility(rid, body.catalog_visibility.as_deref())?;

    let patch = ProductPatch {
        name,
        description: body.description,
        short_description: body.short_description,
        sku: body.sku,
        price: body.price,
        sale_price: body.sale_price,
        stock_quantity: body.stock_quantity,
        manage_stock: body.manage_stock,
        in_stock: body.in_stock,
        weight: body.weight,
        dimensions: body.dimensions,
        status,
        featured: body.featured,
        catalog_visibility: visibility,
        meta_data: body.meta_data,
        images: body.images,
    };

    let row = shopsync_db::update_product(&state.pool, id, &patch)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    if let Some(category_ids) = &body.category_ids {
        shopsync_db::set_product_categories(&state.pool, row.id, category_ids)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;
    }
    enqueue_if_auto(&state, rid, row.id).await?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeleteResponse>>, ApiError> {
    shopsync_db::soft_delete_product(&state.pool, id)
        .await
        .map_err(|e| match e {
            shopsync_db::DbError::HasReferences => ApiError::new(
                req_id.0.clone(),
                "validation_error",
                "product is referenced by existing orders",
            ),
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: DeleteResponse { deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/v1/products/{id}/stock
pub(super) async fn update_stock(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<StockRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;

    if body.quantity < 0 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "quantity must not be negative",
        ));
    }
    let operation = StockOperation::parse(&body.operation).ok_or_else(|| {
        ApiError::new(
            rid,
            "validation_error",
            format!(
                "operation must be 'set', 'add', or 'subtract', got '{}'",
                body.operation
            ),
        )
    })?;

    let row = shopsync_db::mutate_stock(&state.pool, id, body.quantity, operation)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    enqueue_if_auto(&state, rid, row.id).await?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
