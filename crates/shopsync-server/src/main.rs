mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(shopsync_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = shopsync_db::PoolConfig::from_app_config(&config);
    let pool = shopsync_db::connect_pool(&config.database_url, pool_config).await?;
    shopsync_db::run_migrations(&pool).await?;

    let woo = Arc::new(shopsync_woo::WooClient::new(&woo_config(&config))?);

    let orphaned = shopsync_db::requeue_orphaned_tasks(&pool).await?;
    if orphaned > 0 {
        tracing::info!(orphaned, "requeued sync tasks orphaned by a previous run");
    }

    let workers = shopsync_sync::spawn_workers(
        pool.clone(),
        Arc::clone(&woo),
        shopsync_sync::WorkerOptions {
            max_attempts: config.sync_max_attempts,
            backoff_base_ms: config.sync_backoff_base_ms,
            worker_count: config.sync_worker_count,
            poll_interval: Duration::from_millis(500),
        },
    );

    let state = AppState {
        pool,
        woo,
        auto_sync: config.woo_auto_sync,
        sync_batch_size: config.woo_sync_batch_size,
    };
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The HTTP side has drained; stop the pollers. A push interrupted
    // mid-task leaves its row in `running`, which the next startup requeues.
    for worker in workers {
        worker.abort();
    }
    Ok(())
}

fn woo_config(config: &shopsync_core::AppConfig) -> shopsync_woo::WooConfig {
    shopsync_woo::WooConfig {
        base_url: config.woo_base_url.clone(),
        consumer_key: config.woo_consumer_key.clone(),
        consumer_secret: config.woo_consumer_secret.clone(),
        timeout_secs: config.woo_request_timeout_secs,
        ssl_verify: config.woo_ssl_verify,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
