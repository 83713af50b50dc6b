//! Prometheus exposition, grounded on the `metrics` + `metrics-exporter-prometheus`
//! pattern used by the gateway in the tensorzero pack repo
//! (`gateway/src/observability.rs`): install a global recorder once at
//! startup, then render its handle's text body at `GET /metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Metric family names, kept as constants so callers can't typo a label.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "requests_total";
    pub const REQUEST_DURATION_SECONDS: &str = "request_duration_seconds";
    pub const JOBS_RUNNING: &str = "jobs_running";
    pub const JOBS_SUBMITTED_TOTAL: &str = "jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "jobs_completed_total";
    pub const RUN_DURATION_SECONDS: &str = "run_duration_seconds";
    pub const JOB_DURATION_SECONDS: &str = "job_duration_seconds";
    pub const QUEUE_DEPTH: &str = "queue_depth";
    pub const WORKERS_BUSY: &str = "workers_busy";
    pub const DB_POOL_CONNECTIONS: &str = "db_pool_connections";
    pub const DB_POOL_IDLE_CONNECTIONS: &str = "db_pool_idle_connections";
}

/// Holds the installed recorder's render handle, stashed in app state so the
/// `/metrics` handler can call `.render()` on every scrape without touching
/// global state again.
#[derive(Clone)]
pub struct PrometheusHandleHolder(pub PrometheusHandle);

impl PrometheusHandleHolder {
    pub fn render(&self) -> String {
        self.0.render()
    }
}

/// Installs the process-wide Prometheus recorder. Must be called exactly
/// once, before the first metric is recorded.
pub fn install_prometheus() -> Result<PrometheusHandleHolder, String> {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| format!("failed to install Prometheus recorder: {e}"))?;
    Ok(PrometheusHandleHolder(handle))
}
