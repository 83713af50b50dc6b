//! Shared fixture for the integration tests in this directory, grounded on
//! the teacher's `server::test::TestServer` helper: build a real `AppState`
//! over the `test-support` in-memory store and hand back `web::Data` ready
//! for `actix_web::test::init_service`.

use std::sync::{Arc, OnceLock};

use sortbench_common::{metrics::PrometheusHandleHolder, BlockingThreadpool};
use sortbench_db::worker::CancelRegistry;
use sortbench_engine::PluginLoader;
use sortbench_settings::Settings;
use sortbench_web::{auth::ApiKeySet, state::AppState};

static PROMETHEUS: OnceLock<PrometheusHandleHolder> = OnceLock::new();

fn prometheus_handle() -> PrometheusHandleHolder {
    PROMETHEUS
        .get_or_init(|| sortbench_common::install_prometheus().expect("install recorder once"))
        .clone()
}

/// Builds app state with no API keys configured (auth gate open) and the
/// default test caps from `Settings::test_settings()`.
pub fn test_state() -> actix_web::web::Data<AppState> {
    test_state_with(Settings::test_settings(), ApiKeySet::default())
}

pub fn test_state_with(settings: Settings, api_keys: ApiKeySet) -> actix_web::web::Data<AppState> {
    actix_web::web::Data::new(AppState::new(
        Arc::new(settings),
        sortbench_db::test_store(),
        Arc::new(PluginLoader::new()),
        Arc::new(BlockingThreadpool::default()),
        CancelRegistry::new(),
        prometheus_handle(),
        api_keys,
    ))
}
