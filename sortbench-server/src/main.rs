//! Lifecycle Controller (SPEC_FULL.md §C11): loads settings, wires up the
//! job store, plugin loader, and worker pool, binds the HTTP server, and
//! drives graceful shutdown. Mirrors the teacher's `main.rs` shape — load
//! config, init logging, build server, run — with the `docopt`-driven CLI
//! surface dropped in favor of `Settings::from_env()` alone (recorded in
//! DESIGN.md).

mod lifecycle;
mod logging;

use std::{sync::Arc, time::Duration};

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use sortbench_common::BlockingThreadpool;
use sortbench_db::{store_from_settings, WorkerPool};
use sortbench_engine::PluginLoader;
use sortbench_settings::Settings;
use sortbench_web::{app::configure, auth::ApiKeySet, middleware::MetricsWrapper, state::AppState};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::from_env()?;
    let _log_guard = logging::init_logging(&settings.log_level, settings.human_logs);

    tracing::info!(banner = %settings.banner(), "starting sortbench-server");

    if settings.engine_bin.is_some() || settings.engine_cgo {
        tracing::warn!("ENGINE_BIN/ENGINE_CGO set but this build only ships the in-process engine collaborator");
    }

    let prometheus = sortbench_common::install_prometheus()?;
    let api_keys = ApiKeySet::load(settings.api_keys.as_deref(), settings.api_keys_file.as_deref())?;

    let store = store_from_settings(settings.database_url.as_deref(), settings.db_max_conns).await?;
    let plugin_loader = Arc::new(PluginLoader::new());
    let blocking = Arc::new(BlockingThreadpool::default());

    // Workers run against the `JobStore` interface regardless of which
    // variant `store_from_settings` picked — the in-memory store gives the
    // same lease atomicity the durable one does (see
    // sortbench-db/src/worker.rs), so the pool isn't gated to durable mode.
    let worker_timeout = Duration::from_millis(settings.timeout_ms);
    let worker_loader = Arc::clone(&plugin_loader);
    let worker_blocking = Arc::clone(&blocking);
    let worker_pool = WorkerPool::spawn(settings.workers, Arc::clone(&store), worker_timeout, move |call, _token| {
        let loader = Arc::clone(&worker_loader);
        let blocking = Arc::clone(&worker_blocking);
        async move {
            blocking
                .spawn::<_, _, sortbench_web::error::ApiError>(move || {
                    sortbench_engine::run(&call, &loader).map_err(sortbench_web::error::ApiError::from)
                })
                .await
                .map_err(|e| e.to_string())
        }
    });

    let cancel_registry = worker_pool.cancel_registry();
    let settings = Arc::new(settings);

    lifecycle::spawn_metric_periodic_reporter(Arc::clone(&store));

    let state = web::Data::new(AppState::new(
        Arc::clone(&settings),
        store,
        plugin_loader,
        blocking,
        cancel_registry.clone(),
        prometheus,
        api_keys,
    ));

    let bind_addr = (settings.host.clone(), settings.port);

    let server = HttpServer::new({
        let state = state.clone();
        move || {
            App::new()
                .wrap(MetricsWrapper)
                .wrap(Cors::permissive())
                .configure(configure(state.clone()))
        }
    })
    .shutdown_timeout(30)
    .bind(bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    lifecycle::shutdown_signal().await;
    tracing::info!("shutdown signal received, cancelling outstanding jobs");
    cancel_registry.cancel_all();
    server_handle.stop(true).await;
    worker_pool.abort();

    server_task.await??;

    Ok(())
}
