//! Worker pool (spec.md §4.8): `n` tasks loop lease → run-under-timeout →
//! terminal write → short sleep on empty lease. Runs against the `JobStore`
//! interface uniformly for both variants — the in-memory store's
//! `lease_next` gives the same atomicity guarantee as the durable store's
//! `SKIP LOCKED` transaction, so one worker loop serves both (see
//! DESIGN.md).

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use sortbench_common::metrics::names;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{JobId, JobOutcome, JobStore};

const EMPTY_LEASE_BACKOFF: Duration = Duration::from_millis(100);

/// Per-job cancellation, populated on lease and cleared on completion —
/// spec.md §9's "process-local map keyed by job id". Shared between the
/// worker pool and whatever HTTP handler services `POST
/// /jobs/{id}/cancel`.
#[derive(Clone, Default)]
pub struct CancelRegistry {
    tokens: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, id: JobId) -> CancellationToken {
        let token = CancellationToken::new();
        self.tokens
            .lock()
            .expect("cancel registry lock poisoned")
            .insert(id, token.clone());
        token
    }

    fn clear(&self, id: &str) {
        self.tokens.lock().expect("cancel registry lock poisoned").remove(id);
    }

    /// Signals the job's token if it's currently leased by this process.
    /// A no-op if the job isn't leased here (already terminal, or leased by
    /// another process in durable mode) — the caller also updates the
    /// store directly for the pending-job case.
    pub fn cancel(&self, id: &str) {
        if let Some(token) = self.tokens.lock().expect("cancel registry lock poisoned").get(id) {
            token.cancel();
        }
    }

    /// Signals every job currently leased by this process — the lifecycle
    /// controller's shutdown step (spec.md §4.11: "broadcast cancel to
    /// every non-terminal job"). Pending jobs aren't registered here and so
    /// are left untouched, matching spec.md §4.11's "pending jobs in
    /// durable mode remain pending".
    pub fn cancel_all(&self) {
        for token in self.tokens.lock().expect("cancel registry lock poisoned").values() {
            token.cancel();
        }
    }
}

pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    registry: CancelRegistry,
    busy: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Spawns `n` worker tasks against `store`, each running engine
    /// invocations through `run_call` under `timeout`. Instruments
    /// `jobs_running`/`workers_busy` gauges and the
    /// `jobs_completed_total`/`job_duration_seconds` families per spec.md
    /// §4.10 — a single code path covers both `JobStore` variants.
    pub fn spawn<F, Fut>(n: usize, store: Arc<dyn JobStore>, timeout: Duration, run_call: F) -> Self
    where
        F: Fn(sortbench_engine::EngineCall, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Vec<sortbench_engine::ResultRow>, String>> + Send + 'static,
    {
        let registry = CancelRegistry::new();
        let run_call = Arc::new(run_call);
        let busy = Arc::new(AtomicU64::new(0));
        let mut handles = Vec::with_capacity(n);

        for worker_id in 0..n {
            let store = Arc::clone(&store);
            let registry = registry.clone();
            let run_call = Arc::clone(&run_call);
            let busy = Arc::clone(&busy);

            handles.push(tokio::spawn(async move {
                loop {
                    match store.lease_next().await {
                        Ok(Some((id, call))) => {
                            tracing::debug!(worker_id, job_id = %id, "leased job");
                            let token = registry.register(id.clone());
                            busy.fetch_add(1, Ordering::Relaxed);
                            metrics::gauge!(names::JOBS_RUNNING).increment(1.0);
                            metrics::gauge!(names::WORKERS_BUSY).increment(1.0);
                            let started = std::time::Instant::now();

                            let outcome = tokio::select! {
                                result = tokio::time::timeout(timeout, run_call(call, token.clone())) => {
                                    match result {
                                        Ok(Ok(rows)) => JobOutcome::Done(rows),
                                        Ok(Err(message)) => JobOutcome::Failed(message),
                                        Err(_elapsed) => JobOutcome::Canceled("deadline exceeded".to_owned()),
                                    }
                                }
                                () = token.cancelled() => {
                                    JobOutcome::Canceled(String::new())
                                }
                            };

                            let result_label = outcome_label(&outcome);
                            metrics::counter!(names::JOBS_COMPLETED_TOTAL, "result" => result_label).increment(1);
                            metrics::histogram!(names::JOB_DURATION_SECONDS, "result" => result_label)
                                .record(started.elapsed().as_secs_f64());
                            metrics::gauge!(names::JOBS_RUNNING).decrement(1.0);
                            metrics::gauge!(names::WORKERS_BUSY).decrement(1.0);
                            busy.fetch_sub(1, Ordering::Relaxed);

                            registry.clear(&id);
                            if let Err(e) = store.complete(&id, outcome).await {
                                tracing::warn!(worker_id, job_id = %id, error = %e, "failed to record job outcome");
                            }
                        }
                        Ok(None) => {
                            tokio::time::sleep(EMPTY_LEASE_BACKOFF).await;
                        }
                        Err(e) => {
                            tracing::warn!(worker_id, error = %e, "lease attempt failed, backing off");
                            tokio::time::sleep(EMPTY_LEASE_BACKOFF).await;
                        }
                    }
                }
            }));
        }

        Self { handles, registry, busy }
    }

    pub fn cancel_registry(&self) -> CancelRegistry {
        self.registry.clone()
    }

    /// Snapshot of workers currently executing a leased job.
    pub fn busy_count(&self) -> u64 {
        self.busy.load(Ordering::Relaxed)
    }

    /// Aborts every worker task. Used at shutdown after in-flight jobs have
    /// already been signaled to cancel via the registry.
    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

fn outcome_label(outcome: &JobOutcome) -> &'static str {
    match outcome {
        JobOutcome::Done(_) => "done",
        JobOutcome::Failed(_) => "failed",
        JobOutcome::Canceled(_) => "canceled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_registry_signals_only_registered_jobs() {
        let registry = CancelRegistry::new();
        let token = registry.register("job-1".to_owned());
        registry.cancel("job-2");
        assert!(!token.is_cancelled());
        registry.cancel("job-1");
        assert!(token.is_cancelled());
    }
}
