//! Category-scoped product listing.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::middleware::RequestId;

use super::products::{filters_from_query, ListQuery, ProductItem, ProductListData};
use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// GET /api/v1/categories/{id}/products
///
/// The full listing filter set applies; the path segment pins the category
/// and wins over any `category_id` query parameter.
pub(super) async fn list_category_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<ProductListData>>, ApiError> {
    shopsync_db::find_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "category not found"))?;

    let mut filters = filters_from_query(&req_id.0, &query)?;
    filters.category_id = Some(id);

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
