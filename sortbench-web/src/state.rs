//! Process-wide shared state (spec.md §9's "Global mutable state"):
//! configuration caps, the job store, the plugin loader, the blocking
//! threadpool, the rate limiter, the API key set, and the worker pool's
//! cancel registry. Built once at startup by `sortbench-server` and handed
//! to every handler behind `actix_web::web::Data`.

use std::sync::Arc;

use sortbench_common::{metrics::PrometheusHandleHolder, BlockingThreadpool};
use sortbench_db::{worker::CancelRegistry, JobStore};
use sortbench_engine::PluginLoader;
use sortbench_settings::Settings;
use tokio::sync::Mutex as AsyncMutex;

use crate::{auth::ApiKeySet, ratelimit::RateLimiter};

pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn JobStore>,
    pub plugin_loader: Arc<PluginLoader>,
    pub blocking: Arc<BlockingThreadpool>,
    pub rate_limiter: Arc<RateLimiter>,
    pub api_keys: ApiKeySet,
    pub cancel_registry: CancelRegistry,
    pub prometheus: PrometheusHandleHolder,
    /// Serializes the admission check in `POST /jobs` against `enqueue`, so
    /// two requests racing `active_count()` can't both slip past `MaxJobs`
    /// — spec.md §4.9's "the job-submit handler also performs the admission
    /// check atomically with respect to itself".
    pub admission_lock: AsyncMutex<()>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<dyn JobStore>,
        plugin_loader: Arc<PluginLoader>,
        blocking: Arc<BlockingThreadpool>,
        cancel_registry: CancelRegistry,
        prometheus: PrometheusHandleHolder,
        api_keys: ApiKeySet,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(settings.rate_limit_b, settings.rate_limit_r));
        Self {
            settings,
            store,
            plugin_loader,
            blocking,
            rate_limiter,
            api_keys,
            cancel_registry,
            prometheus,
            admission_lock: AsyncMutex::new(()),
        }
    }
}
