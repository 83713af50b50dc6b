//! The job store: a two-variant capability interface (§4.7, §9's
//! "two-variant store abstraction") plus the worker pool that drives it.
//! Mirrors the teacher's `syncstorage-db-common` (`DbPool`/`Db` traits) +
//! `syncstorage-postgres` (the concrete Postgres implementation) split.

pub mod error;
pub mod memory;
pub mod pg;
pub mod worker;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sortbench_engine::{EngineCall, ResultRow};

pub use error::{DbError, DbResult};
pub use memory::InMemoryJobStore;
pub use pg::PgJobStore;
pub use worker::WorkerPool;

pub type JobId = String;

/// Job lifecycle per spec.md §3: `pending → running (exactly once) →
/// terminal`. Terminal states are sticky.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed | JobStatus::Canceled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job record as exposed to clients and stored by either `JobStore`
/// variant. `result`/`error` occupancy follows spec.md §4.7's invariants:
/// `result` is `Some` iff `status == Done`; `error` is `Some` iff
/// `status ∈ {Failed, Canceled}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub request: EngineCall,
    pub result: Option<Vec<ResultRow>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
}

/// The terminal disposition a worker reports back through `complete`.
pub enum JobOutcome {
    Done(Vec<ResultRow>),
    Failed(String),
    /// Empty string is valid — spec.md §4.7: "error is present iff status ∈
    /// {failed, canceled} (may be empty string for canceled)".
    Canceled(String),
}

impl JobOutcome {
    fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Done(_) => JobStatus::Done,
            JobOutcome::Failed(_) => JobStatus::Failed,
            JobOutcome::Canceled(_) => JobStatus::Canceled,
        }
    }
}

/// What `cancel()` reports back to the caller. Per spec.md §9's Open
/// Question, this implementation takes the spec's own default reading:
/// cancellation of an already-terminal job still reports `Cancelled` (the
/// spec's literal "may be a latent UX bug" default), recorded in
/// DESIGN.md.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
}

/// The job store capability interface (spec.md §9: "code that depends on
/// it must not reach behind the interface"). Two implementations —
/// `InMemoryJobStore` and `PgJobStore` — share it so `WorkerPool` and the
/// HTTP handlers never know which one is in play.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Inserts a new `pending` record and returns its id.
    async fn enqueue(&self, request: EngineCall) -> DbResult<JobId>;

    /// Atomically leases the oldest `pending` record, transitioning it to
    /// `running` with `started_at = now()`, and returns it. `None` when no
    /// pending record exists. The in-memory variant achieves the same
    /// atomicity as the durable variant's `SELECT ... FOR UPDATE SKIP
    /// LOCKED` by taking the map's write lock for the whole scan-and-flip.
    async fn lease_next(&self) -> DbResult<Option<(JobId, EngineCall)>>;

    /// Records a terminal outcome for a leased job.
    async fn complete(&self, id: &str, outcome: JobOutcome) -> DbResult<()>;

    async fn get(&self, id: &str) -> DbResult<Option<JobRecord>>;

    /// Per spec.md §4.7: "in all cases, update status='canceled' in SQL
    /// when the row is still 'pending'". Running jobs are left for the
    /// worker pool's cancellation token to actually interrupt; this call
    /// only ever mutates pending rows, but always reports `Cancelled` for
    /// an existing id (see `CancelOutcome`'s doc comment).
    async fn cancel(&self, id: &str) -> DbResult<CancelOutcome>;

    /// Count of jobs in `{pending, running}`, for `MaxJobs` admission.
    async fn active_count(&self) -> DbResult<u64>;

    /// Connection pool introspection for `GET /limits` and the periodic
    /// metrics reporter, mirroring the teacher's `GetPoolState`. `None` for
    /// the in-memory variant, which has no pool.
    async fn pool_state(&self) -> Option<PoolState> {
        None
    }
}

/// Snapshot of a durable store's connection pool, reported by `PgJobStore`.
#[derive(Copy, Clone, Debug)]
pub struct PoolState {
    pub size: u32,
    pub available: i64,
}

/// Builds the configured job store from `DATABASE_URL`, the way the
/// teacher's `pool_from_settings` dispatches on connection-string scheme.
/// Returned behind `Arc` — both variants are process-wide shared state
/// (spec.md §9's "Global mutable state"), not a per-caller handle, so
/// callers share one instance rather than cloning a trait object.
/// A fresh in-memory store behind the same `Arc<dyn JobStore>` shape
/// `store_from_settings` returns, for handler/integration tests that need a
/// `JobStore` without a database — SPEC_FULL.md §4's "a `test-support`
/// feature on `sortbench-db` exposing an in-memory store constructor for
/// handler tests."
#[cfg(feature = "test-support")]
pub fn test_store() -> std::sync::Arc<dyn JobStore> {
    std::sync::Arc::new(InMemoryJobStore::new())
}

pub async fn store_from_settings(
    database_url: Option<&str>,
    max_conns: u32,
) -> DbResult<std::sync::Arc<dyn JobStore>> {
    match database_url {
        Some(url) if !url.is_empty() => {
            let store = PgJobStore::new(url, max_conns).await?;
            Ok(std::sync::Arc::new(store))
        }
        _ => Ok(std::sync::Arc::new(InMemoryJobStore::new())),
    }
}
