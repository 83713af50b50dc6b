//! Liveness, readiness, metrics exposition, and effective-limits reporting
//! (spec.md §6) — the unauthenticated, unrated "operational surface" the
//! teacher's Dockerflow endpoints (`/__heartbeat__`, `/__lbheartbeat__`)
//! occupy in `syncserver::lib::configure_dockerflow`.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use sortbench_engine::{Distribution, ElemType};

use crate::{error::ApiError, state::AppState};

pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

/// Runs one tiny real benchmark through the engine rather than only
/// checking algorithm discovery, per SPEC_FULL.md §5 ("Readiness smoke
/// run") — catches a broken in-process engine the way the teacher's
/// heartbeat does a real DB round trip.
pub async fn readyz(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let call = sortbench_engine::EngineCall {
        n: 8,
        distribution: Distribution::Random,
        elem_type: ElemType::I32,
        repeats: 1,
        warmup: 0,
        seed: sortbench_engine::DEFAULT_SEED,
        threads: 0,
        assert_sorted: true,
        baseline: None,
        algorithms: vec!["std_sort".to_owned()],
        plugins: vec![],
        tunables: Default::default(),
    };

    let loader = state.plugin_loader.clone();
    state
        .blocking
        .spawn::<_, _, ApiError>(move || sortbench_engine::run(&call, &loader).map_err(ApiError::from))
        .await?;

    Ok(HttpResponse::Ok().body("ready"))
}

pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(state.prometheus.render())
}

#[derive(Serialize)]
struct RateLimitLimits {
    capacity: f64,
    refill_per_minute: f64,
}

#[derive(Serialize)]
struct PoolLimits {
    size: u32,
    available: i64,
}

#[derive(Serialize)]
struct LimitsBody {
    max_n: u64,
    max_repeats: u32,
    max_threads: u32,
    max_jobs: u64,
    timeout_ms: u64,
    workers: usize,
    rate_limit: RateLimitLimits,
    trust_xff: bool,
    mode: &'static str,
    durable: bool,
    active_jobs: u64,
    pool: Option<PoolLimits>,
}

/// `GET /limits`: effective caps plus, in durable mode, pool state —
/// SPEC_FULL.md §5's analogue of the teacher's `ServerState::limits_json`
/// combined with `GetPoolState::state()`.
pub async fn limits(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let active_jobs = state.store.active_count().await?;
    let pool = state.store.pool_state().await.map(|p| PoolLimits {
        size: p.size,
        available: p.available,
    });

    let body = LimitsBody {
        max_n: state.settings.max_n,
        max_repeats: state.settings.max_repeats,
        max_threads: state.settings.max_threads,
        max_jobs: state.settings.max_jobs,
        timeout_ms: state.settings.timeout_ms,
        workers: state.settings.workers,
        rate_limit: RateLimitLimits {
            capacity: state.settings.rate_limit_b,
            refill_per_minute: state.settings.rate_limit_r,
        },
        trust_xff: state.settings.trust_xff,
        // This build only ever ships the in-process engine collaborator,
        // see DESIGN.md's Open Question decision on engine execution mode.
        mode: "in-process",
        durable: state.settings.durable_mode(),
        active_jobs,
        pool,
    };

    Ok(HttpResponse::Ok().json(body))
}
