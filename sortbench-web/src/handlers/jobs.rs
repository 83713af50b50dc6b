//! Job submission, polling, and cancellation (spec.md §4.7, §4.9, §6).

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sortbench_common::metrics::names;
use sortbench_db::{CancelOutcome, JobStatus};
use sortbench_engine::ResultRow;

use crate::{
    error::ApiError,
    state::AppState,
    validate::{build_engine_args, BenchmarkRequest},
};

/// The wire shape of a job record, spec.md §6: deliberately narrower than
/// `sortbench_db::JobRecord` (drops `request`, which clients already know).
#[derive(Serialize)]
struct JobView {
    id: String,
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Vec<ResultRow>>,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<i64>,
}

impl From<sortbench_db::JobRecord> for JobView {
    fn from(record: sortbench_db::JobRecord) -> Self {
        Self {
            id: record.id,
            status: record.status,
            error: record.error,
            result: record.result,
            created_at: record.created_at,
            started_at: record.started_at,
            finished_at: record.finished_at,
            duration_ms: record.duration_ms,
        }
    }
}

#[derive(Serialize)]
struct EnqueueBody {
    job_id: String,
}

/// `POST /jobs`: validates, then performs the admission check against
/// `active_count()` atomically with respect to `enqueue` via
/// `AppState::admission_lock` — spec.md §4.9's "atomically with respect to
/// itself within the request goroutine".
pub async fn submit(state: web::Data<AppState>, body: web::Json<BenchmarkRequest>) -> Result<HttpResponse, ApiError> {
    let call = build_engine_args(&body, &state.settings)?;

    let guard = state.admission_lock.lock().await;
    let active = state.store.active_count().await?;
    if active >= state.settings.max_jobs {
        return Err(ApiError::admission());
    }
    let job_id = state.store.enqueue(call).await?;
    drop(guard);

    metrics::counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);

    Ok(HttpResponse::Accepted().json(EnqueueBody { job_id }))
}

pub async fn get(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let record = state
        .store
        .get(&path.into_inner())
        .await?
        .ok_or_else(ApiError::not_found)?;

    Ok(HttpResponse::Ok().json(JobView::from(record)))
}

#[derive(Serialize)]
struct CancelBody {
    status: &'static str,
}

/// `POST /jobs/{id}/cancel`: signals the in-process cancel token (a no-op if
/// the job isn't currently leased here) and updates the store, per
/// spec.md §4.7/§5. Per the `CancelOutcome` Open Question decision recorded
/// in DESIGN.md, an already-terminal job still reports `200 {"status":
/// "cancelled"}`.
pub async fn cancel(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    match state.store.cancel(&id).await? {
        CancelOutcome::Cancelled => {
            state.cancel_registry.cancel(&id);
            Ok(HttpResponse::Ok().json(CancelBody { status: "cancelled" }))
        }
        CancelOutcome::NotFound => Err(ApiError::not_found()),
    }
}
