//! Outbound push: drains the `sync_tasks` queue into the store.
//!
//! Workers poll the queue and run one task at a time. All cross-worker
//! coordination lives in the claim query (`shopsync_db::next_sync_task`), so
//! workers themselves are stateless and can be scaled by just spawning more.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;

use shopsync_db::{DbError, SyncTaskRow};
use shopsync_woo::{backoff_delay_ms, is_retriable, WooClient, WooError};

use crate::mapping;

/// Retry and polling knobs for the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Total executions per task before it is marked failed.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub worker_count: usize,
    pub poll_interval: Duration,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1_000,
            worker_count: 4,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// What became of a claimed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Pushed to the store; the task row is gone.
    Completed,
    /// The product vanished before the push; the task row is gone.
    Discarded,
    /// Transient failure; the task went back to pending with a delay.
    Retried,
    /// Terminal failure; the row stays behind as `failed`.
    Failed,
}

/// Spawns the worker pool. The returned handles run until aborted; the
/// server aborts them during shutdown after the HTTP listener drains.
#[must_use]
pub fn spawn_workers(
    pool: PgPool,
    client: Arc<WooClient>,
    options: WorkerOptions,
) -> Vec<JoinHandle<()>> {
    (0..options.worker_count.max(1))
        .map(|worker| {
            let pool = pool.clone();
            let client = Arc::clone(&client);
            let options = options.clone();
            tokio::spawn(async move {
                tracing::debug!(worker, "sync: worker started");
                run_worker(&pool, &client, &options).await;
            })
        })
        .collect()
}

async fn run_worker(pool: &PgPool, client: &WooClient, options: &WorkerOptions) {
    loop {
        match process_next_task(pool, client, options).await {
            // Claimed and handled something; poll again immediately in case
            // the queue has more.
            Ok(Some(_)) => {}
            Ok(None) => tokio::time::sleep(options.poll_interval).await,
            Err(err) => {
                tracing::error!(error = %err, "sync: queue poll failed");
                tokio::time::sleep(options.poll_interval).await;
            }
        }
    }
}

/// Claims and runs at most one task. Returns `None` when the queue had
/// nothing runnable.
///
/// # Errors
///
/// Returns [`DbError`] only for queue-level failures (claim or state
/// transition). Store errors are absorbed into the task's retry/fail
/// transition and reported through [`TaskOutcome`].
pub async fn process_next_task(
    pool: &PgPool,
    client: &WooClient,
    options: &WorkerOptions,
) -> Result<Option<TaskOutcome>, DbError> {
    let Some(task) = shopsync_db::next_sync_task(pool).await? else {
        return Ok(None);
    };
    let outcome = run_task(pool, client, options, &task).await?;
    Ok(Some(outcome))
}

async fn run_task(
    pool: &PgPool,
    client: &WooClient,
    options: &WorkerOptions,
    task: &SyncTaskRow,
) -> Result<TaskOutcome, DbError> {
    // Re-read at execution time so a delayed task never ships stale data.
    let Some(product) = shopsync_db::find_product(pool, task.product_id).await? else {
        tracing::debug!(
            task_id = task.id,
            product_id = task.product_id,
            "sync: product gone, discarding task"
        );
        shopsync_db::complete_sync_task(pool, task.id).await?;
        return Ok(TaskOutcome::Discarded);
    };

    let category_ids = shopsync_db::category_woo_ids_for_product(pool, product.id).await?;
    let payload = mapping::to_remote(&product, &category_ids);

    let pushed = match product.woo_id {
        Some(woo_id) => client.update_product(woo_id, &payload).await.map(|_| ()),
        None => match client.create_product(&payload).await {
            Ok(remote) => {
                shopsync_db::set_woo_id(pool, product.id, remote.id).await?;
                Ok(())
            }
            Err(err) => Err(err),
        },
    };

    match pushed {
        Ok(()) => {
            shopsync_db::complete_sync_task(pool, task.id).await?;
            tracing::info!(
                product_id = product.id,
                product_name = %product.name,
                task_id = task.id,
                "sync: product pushed"
            );
            Ok(TaskOutcome::Completed)
        }
        Err(err) => handle_push_error(pool, options, task, &product.name, &err).await,
    }
}

/// Applies the retry policy after a failed push. Transient errors burn one
/// attempt and reschedule with exponential back-off; terminal errors fail
/// the task outright.
async fn handle_push_error(
    pool: &PgPool,
    options: &WorkerOptions,
    task: &SyncTaskRow,
    product_name: &str,
    err: &WooError,
) -> Result<TaskOutcome, DbError> {
    let executions = u32::try_from(task.attempts).unwrap_or(u32::MAX).saturating_add(1);
    let budget_left = executions < options.max_attempts.max(1);

    if is_retriable(err) && budget_left {
        let delay_ms = backoff_delay_ms(options.backoff_base_ms, executions);
        shopsync_db::retry_sync_task(pool, task.id, &err.to_string(), delay_ms).await?;
        tracing::warn!(
            product_id = task.product_id,
            product_name = %product_name,
            task_id = task.id,
            attempt = executions,
            delay_ms,
            error = %err,
            "sync: push failed, will retry"
        );
        Ok(TaskOutcome::Retried)
    } else {
        shopsync_db::fail_sync_task(pool, task.id, &err.to_string()).await?;
        tracing::error!(
            product_id = task.product_id,
            product_name = %product_name,
            task_id = task.id,
            attempts = executions,
            error = %err,
            "sync: push failed permanently"
        );
        Ok(TaskOutcome::Failed)
    }
}
