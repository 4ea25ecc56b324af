//! On-demand inbound reconciliation.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use shopsync_sync::SyncError;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Default, Deserialize)]
pub(super) struct SyncRemoteRequest {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncRemoteData {
    pub created: u32,
    pub updated: u32,
    pub errors: Vec<SyncItemData>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncItemData {
    pub woo_id: i64,
    pub message: String,
}

/// POST /api/v1/products/sync-remote
///
/// Runs synchronously in the request: pulls one page from the store and
/// upserts it, returning the tally. Item-level failures are part of the
/// tally, not an error status.
pub(super) async fn sync_remote(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<SyncRemoteRequest>>,
) -> Result<Json<ApiResponse<SyncRemoteData>>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let page = body.page.unwrap_or(1).max(1);
    let per_page = body.per_page.unwrap_or(state.sync_batch_size).clamp(1, 100);

    let report = shopsync_sync::sync_from_remote(&state.pool, &state.woo, page, per_page)
        .await
        .map_err(|e| match e {
            SyncError::Woo(err) => {
                tracing::warn!(error = %err, "inbound sync could not reach the store");
                ApiError::new(req_id.0.clone(), "upstream_error", "store request failed")
            }
            SyncError::Db(err) => map_db_error(req_id.0.clone(), &err),
        })?;

    Ok(Json(ApiResponse {
        data: SyncRemoteData {
            created: report.created,
            updated: report.updated,
            errors: report
                .errors
                .into_iter()
                .map(|e| SyncItemData {
                    woo_id: e.woo_id,
                    message: e.message,
                })
                .collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
