//! `InMemoryJobStore`: a `RwLock<HashMap<..>>` guarding the map, each
//! record's mutable fields behind their own lock — the "coarse lock around
//! the map, fine lock around the record" split spec.md §4.7/§5 calls for,
//! grounded on the teacher's `syncstorage-postgres::CollectionCache`.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};

use async_trait::async_trait;
use chrono::Utc;
use sortbench_engine::EngineCall;

use crate::{CancelOutcome, DbError, DbResult, JobId, JobOutcome, JobRecord, JobStatus, JobStore};

struct Slot {
    record: Mutex<JobRecord>,
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Arc<Slot>>>,
    /// Insertion order, oldest first — the in-memory analogue of `ORDER BY
    /// created_at ASC` for `lease_next`.
    order: Mutex<Vec<JobId>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn enqueue(&self, request: EngineCall) -> DbResult<JobId> {
        let id = new_job_id();
        let record = JobRecord {
            id: id.clone(),
            status: JobStatus::Pending,
            request,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            duration_ms: None,
        };

        let mut jobs = self.jobs.write().expect("job map lock poisoned");
        jobs.insert(
            id.clone(),
            Arc::new(Slot {
                record: Mutex::new(record),
            }),
        );
        self.order.lock().expect("order lock poisoned").push(id.clone());
        Ok(id)
    }

    async fn lease_next(&self) -> DbResult<Option<(JobId, EngineCall)>> {
        let jobs = self.jobs.write().expect("job map lock poisoned");
        let order = self.order.lock().expect("order lock poisoned");

        for id in order.iter() {
            let Some(slot) = jobs.get(id) else { continue };
            let mut record = slot.record.lock().expect("job record lock poisoned");
            if record.status == JobStatus::Pending {
                record.status = JobStatus::Running;
                record.started_at = Some(Utc::now());
                return Ok(Some((id.clone(), record.request.clone())));
            }
        }
        Ok(None)
    }

    async fn complete(&self, id: &str, outcome: JobOutcome) -> DbResult<()> {
        let jobs = self.jobs.read().expect("job map lock poisoned");
        let slot = jobs.get(id).ok_or_else(|| DbError::not_found(id))?;
        let mut record = slot.record.lock().expect("job record lock poisoned");

        let now = Utc::now();
        record.finished_at = Some(now);
        record.duration_ms = record
            .started_at
            .map(|started| (now - started).num_milliseconds());
        record.status = outcome.status();
        match outcome {
            JobOutcome::Done(rows) => record.result = Some(rows),
            JobOutcome::Failed(msg) => record.error = Some(msg),
            JobOutcome::Canceled(msg) => record.error = Some(msg),
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> DbResult<Option<JobRecord>> {
        let jobs = self.jobs.read().expect("job map lock poisoned");
        Ok(jobs
            .get(id)
            .map(|slot| slot.record.lock().expect("job record lock poisoned").clone()))
    }

    async fn cancel(&self, id: &str) -> DbResult<CancelOutcome> {
        let jobs = self.jobs.read().expect("job map lock poisoned");
        let Some(slot) = jobs.get(id) else {
            return Ok(CancelOutcome::NotFound);
        };

        let mut record = slot.record.lock().expect("job record lock poisoned");
        if record.status == JobStatus::Pending {
            let now = Utc::now();
            record.status = JobStatus::Canceled;
            record.finished_at = Some(now);
            record.duration_ms = record
                .started_at
                .map(|started| (now - started).num_milliseconds())
                .or(Some(0));
            record.error = Some(String::new());
        }
        // Running/terminal jobs: per the Open Question decision in
        // DESIGN.md, still report `Cancelled` to the caller.
        Ok(CancelOutcome::Cancelled)
    }

    async fn active_count(&self) -> DbResult<u64> {
        let jobs = self.jobs.read().expect("job map lock poisoned");
        let count = jobs
            .values()
            .filter(|slot| {
                let status = slot.record.lock().expect("job record lock poisoned").status;
                !status.is_terminal()
            })
            .count();
        Ok(count as u64)
    }
}

fn new_job_id() -> JobId {
    // Time-derived, per spec.md §3 ("opaque string; time-derived in the
    // in-memory variant, UUID in the durable variant").
    format!("{:x}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortbench_engine::{Distribution, DistributionTunables, ElemType};

    fn sample_call() -> EngineCall {
        EngineCall {
            n: 64,
            distribution: Distribution::Sorted,
            elem_type: ElemType::I32,
            repeats: 1,
            warmup: 0,
            seed: 1,
            threads: 0,
            assert_sorted: false,
            baseline: None,
            algorithms: vec!["std_sort".to_owned()],
            plugins: vec![],
            tunables: DistributionTunables::default(),
        }
    }

    #[tokio::test]
    async fn enqueue_then_get_round_trips_pending() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(sample_call()).await.unwrap();
        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Pending);
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn lease_next_transitions_pending_to_running() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(sample_call()).await.unwrap();
        let (leased_id, _call) = store.lease_next().await.unwrap().unwrap();
        assert_eq!(leased_id, id);

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Running);
        assert!(record.started_at.is_some());

        assert!(store.lease_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn complete_sets_terminal_fields() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(sample_call()).await.unwrap();
        store.lease_next().await.unwrap();
        store.complete(&id, JobOutcome::Failed("boom".to_owned())).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.finished_at.is_some());
        assert!(record.duration_ms.is_some());
    }

    #[tokio::test]
    async fn cancel_on_pending_job_is_immediate() {
        let store = InMemoryJobStore::new();
        let id = store.enqueue(sample_call()).await.unwrap();
        let outcome = store.cancel(&id).await.unwrap();
        assert_eq!(outcome, CancelOutcome::Cancelled);

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Canceled);
    }

    #[tokio::test]
    async fn cancel_unknown_id_reports_not_found() {
        let store = InMemoryJobStore::new();
        let outcome = store.cancel("does-not-exist").await.unwrap();
        assert_eq!(outcome, CancelOutcome::NotFound);
    }

    #[tokio::test]
    async fn active_count_excludes_terminal_jobs() {
        let store = InMemoryJobStore::new();
        let pending_id = store.enqueue(sample_call()).await.unwrap();
        let done_id = store.enqueue(sample_call()).await.unwrap();
        store.lease_next().await.unwrap();
        store.complete(&done_id, JobOutcome::Done(vec![])).await.unwrap();

        assert_eq!(store.active_count().await.unwrap(), 1);
        let _ = pending_id;
    }
}
