//! Sync Executor (spec.md §4.6, C6): `POST /run`.

use std::time::{Duration, Instant};

use actix_web::{web, HttpResponse};
use sortbench_common::{metrics::names, InternalError};

use crate::{
    error::ApiError,
    state::AppState,
    validate::{build_engine_args, effective_timeout_ms, BenchmarkRequest},
};

pub async fn run(state: web::Data<AppState>, body: web::Json<BenchmarkRequest>) -> Result<HttpResponse, ApiError> {
    let call = build_engine_args(&body, &state.settings)?;
    let deadline = Duration::from_millis(effective_timeout_ms(&body, &state.settings));

    let dist = call.distribution.as_str();
    let elem_type = call.elem_type.as_str();
    let loader = state.plugin_loader.clone();
    let started = Instant::now();

    let rows = tokio::time::timeout(
        deadline,
        state
            .blocking
            .spawn::<_, _, ApiError>(move || sortbench_engine::run(&call, &loader).map_err(ApiError::from)),
    )
    .await
    .map_err(|_elapsed| ApiError::internal_error("sync run exceeded its deadline".to_owned()))??;

    metrics::histogram!(names::RUN_DURATION_SECONDS, "mode" => "in-process", "dist" => dist, "type" => elem_type)
        .record(started.elapsed().as_secs_f64());

    Ok(HttpResponse::Ok().json(rows))
}
