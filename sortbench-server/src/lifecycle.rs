//! Startup/shutdown helpers (SPEC_FULL.md §C11) and the periodic pool
//! metrics reporter, ported from the teacher's background StatsD gauge
//! task (`server::metrics`) onto the `metrics` crate.

use std::{sync::Arc, time::Duration};

use sortbench_common::metrics::names;
use sortbench_db::JobStore;

const REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Resolves on `SIGINT` or `SIGTERM`, whichever arrives first — spec.md
/// §4.11's shutdown trigger.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Gauges `queue_depth` and, in durable mode, the pool's connection counts
/// every `REPORT_INTERVAL`. Runs for the life of the process; there's
/// nothing to join on shutdown since the task carries no state worth
/// flushing.
pub fn spawn_metric_periodic_reporter(store: Arc<dyn JobStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(REPORT_INTERVAL);
        loop {
            ticker.tick().await;

            match store.active_count().await {
                Ok(active) => metrics::gauge!(names::QUEUE_DEPTH).set(active as f64),
                Err(e) => tracing::warn!(error = %e, "failed to read active job count for periodic report"),
            }

            if let Some(pool) = store.pool_state().await {
                metrics::gauge!(names::DB_POOL_CONNECTIONS).set(pool.size as f64);
                metrics::gauge!(names::DB_POOL_IDLE_CONNECTIONS).set(pool.available as f64);
            }
        }
    });
}
