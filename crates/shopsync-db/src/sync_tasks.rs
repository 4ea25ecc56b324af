//! The outbound sync queue.
//!
//! Tasks are claimed with `FOR UPDATE SKIP LOCKED` under two extra
//! constraints: only the oldest pending task for a product is claimable, and
//! only while no task for that product is running. Together these give
//! enqueue-order execution and single-flight per product, while tasks for
//! different products drain in parallel across workers.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `sync_tasks` table.
///
/// Lifecycle: `pending → running → (deleted on success | pending again with
/// `attempts` bumped | failed)`. Failed rows stay behind for inspection.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncTaskRow {
    pub id: i64,
    pub product_id: i64,
    pub state: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const TASK_COLUMNS: &str =
    "id, product_id, state, attempts, last_error, scheduled_at, created_at, updated_at";

/// Enqueues an outbound push for a product. The task carries only the
/// product id; the worker re-reads the row at execution time so delayed
/// tasks never ship stale data.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn enqueue_sync_task(pool: &PgPool, product_id: i64) -> Result<SyncTaskRow, DbError> {
    let row = sqlx::query_as::<_, SyncTaskRow>(&format!(
        "INSERT INTO sync_tasks (product_id) VALUES ($1) RETURNING {TASK_COLUMNS}"
    ))
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Claims the next runnable task, if any, flipping it to `running`.
///
/// Eligibility: pending, due, no running sibling for the same product, and
/// no older pending sibling (tasks for one product run strictly in enqueue
/// order). `SKIP LOCKED` lets concurrent workers race without blocking; a
/// worker that loses the race simply claims nothing this round.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the claim query fails.
pub async fn next_sync_task(pool: &PgPool) -> Result<Option<SyncTaskRow>, DbError> {
    let row = sqlx::query_as::<_, SyncTaskRow>(&format!(
        "UPDATE sync_tasks SET state = 'running', updated_at = NOW() \
         WHERE id = ( \
             SELECT t.id FROM sync_tasks t \
             WHERE t.state = 'pending' AND t.scheduled_at <= NOW() \
               AND NOT EXISTS ( \
                   SELECT 1 FROM sync_tasks r \
                   WHERE r.product_id = t.product_id AND r.state = 'running') \
               AND NOT EXISTS ( \
                   SELECT 1 FROM sync_tasks o \
                   WHERE o.product_id = t.product_id AND o.state = 'pending' AND o.id < t.id) \
             ORDER BY t.scheduled_at ASC, t.id ASC \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED \
         ) \
         RETURNING {TASK_COLUMNS}"
    ))
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Removes a task that ran to completion (or became moot because the product
/// is gone). Succeeded tasks leave no residue.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn complete_sync_task(pool: &PgPool, task_id: i64) -> Result<(), DbError> {
    sqlx::query("DELETE FROM sync_tasks WHERE id = $1")
        .bind(task_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Returns a task to the pending state with its attempt count bumped and the
/// next run pushed `delay_ms` into the future.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn retry_sync_task(
    pool: &PgPool,
    task_id: i64,
    error: &str,
    delay_ms: u64,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE sync_tasks SET \
             state = 'pending', \
             attempts = attempts + 1, \
             last_error = $2, \
             scheduled_at = NOW() + ($3 * INTERVAL '1 millisecond'), \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(task_id)
    .bind(error)
    .bind(i64::try_from(delay_ms).unwrap_or(i64::MAX))
    .execute(pool)
    .await?;
    Ok(())
}

/// Marks a task permanently failed. It will never be picked up again and no
/// longer blocks younger tasks for the same product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_task(pool: &PgPool, task_id: i64, error: &str) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE sync_tasks SET \
             state = 'failed', \
             attempts = attempts + 1, \
             last_error = $2, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(task_id)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns every `running` task to `pending`. Called once at startup: a task
/// still marked running can only be an orphan from a previous process, and
/// leaving it would block its product's queue forever.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn requeue_orphaned_tasks(pool: &PgPool) -> Result<u64, DbError> {
    let affected = sqlx::query(
        "UPDATE sync_tasks SET state = 'pending', updated_at = NOW() WHERE state = 'running'",
    )
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Fetches a task by id, mostly for observability and tests.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_sync_task(pool: &PgPool, task_id: i64) -> Result<Option<SyncTaskRow>, DbError> {
    let row = sqlx::query_as::<_, SyncTaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM sync_tasks WHERE id = $1"
    ))
    .bind(task_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
