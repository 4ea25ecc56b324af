//! Inbound reconciliation: pulls a page of remote products into the catalog.
//!
//! Each item is persisted independently, so one bad record never sinks the
//! batch. The remote copy wins on every mapped field (last-write-wins).

use sqlx::PgPool;

use shopsync_woo::WooClient;

use crate::mapping;
use crate::SyncError;

/// Tally of one inbound run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub created: u32,
    pub updated: u32,
    pub errors: Vec<SyncItemError>,
}

/// One remote record that could not be persisted.
#[derive(Debug, Clone)]
pub struct SyncItemError {
    pub woo_id: i64,
    pub message: String,
}

/// Fetches one page of remote products and upserts each into the catalog.
///
/// A record with a known `woo_id` updates the matching row; an unknown one
/// creates a row carrying the remote id immediately, so re-running on an
/// unchanged page updates instead of duplicating.
///
/// # Errors
///
/// Returns [`SyncError::Woo`] if the page fetch itself fails; per-item
/// failures land in the report instead.
pub async fn sync_from_remote(
    pool: &PgPool,
    client: &WooClient,
    page: u32,
    per_page: u32,
) -> Result<SyncReport, SyncError> {
    let remotes = client.list_products(page, per_page).await?;
    tracing::info!(page, count = remotes.len(), "sync: pulling remote products");

    let mut report = SyncReport::default();
    for remote in &remotes {
        match upsert_remote(pool, remote).await {
            Ok(created) => {
                if created {
                    report.created += 1;
                } else {
                    report.updated += 1;
                }
            }
            Err(err) => {
                tracing::warn!(
                    woo_id = remote.id,
                    error = %err,
                    "sync: failed to persist remote product"
                );
                report.errors.push(SyncItemError {
                    woo_id: remote.id,
                    message: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        created = report.created,
        updated = report.updated,
        failed = report.errors.len(),
        "sync: inbound run finished"
    );
    Ok(report)
}

/// Returns `true` when the record was created, `false` when updated.
async fn upsert_remote(
    pool: &PgPool,
    remote: &shopsync_woo::RemoteProduct,
) -> Result<bool, SyncError> {
    match shopsync_db::find_product_by_woo_id(pool, remote.id).await? {
        Some(existing) => {
            shopsync_db::update_product(pool, existing.id, &mapping::remote_patch(remote)).await?;
            Ok(false)
        }
        None => {
            shopsync_db::create_product(pool, &mapping::from_remote(remote)).await?;
            Ok(true)
        }
    }
}
