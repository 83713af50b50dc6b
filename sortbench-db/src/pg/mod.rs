//! `PgJobStore`: the durable `JobStore` variant, grounded on
//! `tokenserver-db-postgres`'s pool setup (`diesel-async` + `deadpool`,
//! `diesel_migrations::embed_migrations!`) with the leasing transaction
//! spec.md §4.7 describes verbatim (`SELECT ... FOR UPDATE SKIP LOCKED`).

mod models;
mod schema;

use async_trait::async_trait;
use chrono::Utc;
use diesel::{prelude::*, Connection};
use diesel_async::{
    async_connection_wrapper::AsyncConnectionWrapper,
    pooled_connection::{
        deadpool::{Object, Pool, PoolError},
        AsyncDieselConnectionManager,
    },
    scoped_futures::ScopedFutureExt,
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use diesel_logger::LoggingConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use sortbench_common::InternalError;
use sortbench_engine::EngineCall;

use self::{
    models::{JobRow, NewJobRow, ENGINE_MODE},
    schema::jobs,
};
use crate::{CancelOutcome, DbError, DbResult, JobId, JobOutcome, JobRecord, JobStatus, JobStore, PoolState};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/pg/migrations");

type Conn = Object<AsyncPgConnection>;

pub struct PgJobStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgJobStore {
    /// Connects, runs pending migrations synchronously (via the blocking
    /// `AsyncConnectionWrapper`, the same trick `tokenserver-db-postgres`
    /// uses so the async pool never has to host a sync migration runner),
    /// then builds the pool workers will actually use.
    pub async fn new(database_url: &str, max_conns: u32) -> DbResult<Self> {
        run_embedded_migrations(database_url)?;

        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager)
            .max_size(max_conns as usize)
            .build()
            .map_err(|e| DbError::internal_error(format!("building pg pool: {e}")))?;

        Ok(Self { pool })
    }

    async fn conn(&self) -> DbResult<Conn> {
        self.pool.get().await.map_err(map_pool_error)
    }
}

fn run_embedded_migrations(database_url: &str) -> DbResult<()> {
    let conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(database_url)?;
    LoggingConnection::new(conn)
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::internal_error(format!("running migrations: {e}")))?;
    Ok(())
}

fn map_pool_error(e: PoolError) -> DbError {
    match e {
        PoolError::Backend(be) => DbError::internal_error(format!("pg connection error: {be}")),
        PoolError::Timeout(t) => DbError::internal_error(format!("pg pool timeout: {t:?}")),
        other => DbError::internal_error(format!("pg pool error: {other}")),
    }
}

fn row_to_record(row: JobRow) -> DbResult<JobRecord> {
    let request: EngineCall = serde_json::from_value(row.request_json)
        .map_err(|e| DbError::internal_error(format!("decoding request_json: {e}")))?;
    let result = row
        .result_json
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| DbError::internal_error(format!("decoding result_json: {e}")))?;
    let status = parse_status(&row.status)?;

    Ok(JobRecord {
        id: row.id,
        status,
        request,
        result,
        error: row.error,
        created_at: row.created_at,
        started_at: row.started_at,
        finished_at: row.finished_at,
        duration_ms: row.duration_ms,
    })
}

fn parse_status(s: &str) -> DbResult<JobStatus> {
    match s {
        "pending" => Ok(JobStatus::Pending),
        "running" => Ok(JobStatus::Running),
        "done" => Ok(JobStatus::Done),
        "failed" => Ok(JobStatus::Failed),
        "canceled" => Ok(JobStatus::Canceled),
        other => Err(DbError::internal_error(format!("unknown job status in row: {other}"))),
    }
}

fn duration_ms_since(started_at: Option<chrono::DateTime<Utc>>, now: chrono::DateTime<Utc>) -> Option<i64> {
    started_at.map(|s| (now - s).num_milliseconds())
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn enqueue(&self, request: EngineCall) -> DbResult<JobId> {
        let id = uuid::Uuid::new_v4().to_string();
        let request_json = serde_json::to_value(&request)
            .map_err(|e| DbError::internal_error(format!("encoding request: {e}")))?;
        let algos = request.algorithms.join(",");

        let new_row = NewJobRow {
            id: id.clone(),
            status: JobStatus::Pending.as_str().to_owned(),
            request_json,
            created_at: Utc::now(),
            dist: request.distribution.as_str().to_owned(),
            elem_type: request.elem_type.as_str().to_owned(),
            repeats: request.repeats as i32,
            threads: request.threads as i32,
            baseline: request.baseline.clone(),
            algos,
            mode: ENGINE_MODE.to_owned(),
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(jobs::table)
            .values(&new_row)
            .execute(&mut conn)
            .await?;
        Ok(id)
    }

    async fn lease_next(&self) -> DbResult<Option<(JobId, EngineCall)>> {
        let mut conn = self.conn().await?;

        let leased: Option<JobRow> = conn
            .transaction::<_, DbError, _>(|conn| {
                async move {
                    let rows: Vec<JobRow> = diesel::sql_query(
                        "SELECT * FROM jobs WHERE status = 'pending' \
                         ORDER BY created_at ASC LIMIT 1 FOR UPDATE SKIP LOCKED",
                    )
                    .load(conn)
                    .await?;

                    let Some(row) = rows.into_iter().next() else {
                        return Ok(None);
                    };

                    diesel::update(jobs::table.find(&row.id))
                        .set((jobs::status.eq("running"), jobs::started_at.eq(Utc::now())))
                        .execute(conn)
                        .await?;

                    Ok(Some(row))
                }
                .scope_boxed()
            })
            .await?;

        leased
            .map(|row| {
                let id = row.id.clone();
                let request: EngineCall = serde_json::from_value(row.request_json)
                    .map_err(|e| DbError::internal_error(format!("decoding request_json: {e}")))?;
                Ok((id, request))
            })
            .transpose()
    }

    async fn complete(&self, id: &str, outcome: JobOutcome) -> DbResult<()> {
        let mut conn = self.conn().await?;

        let current: JobRow = jobs::table.find(id).first(&mut conn).await.map_err(|e| match e {
            diesel::result::Error::NotFound => DbError::not_found(id),
            other => DbError::from(other),
        })?;
        let now = Utc::now();
        let duration_ms = duration_ms_since(current.started_at, now);

        match outcome {
            JobOutcome::Done(rows) => {
                let result_json = serde_json::to_value(&rows)
                    .map_err(|e| DbError::internal_error(format!("encoding result: {e}")))?;
                diesel::update(jobs::table.find(id))
                    .set((
                        jobs::status.eq(JobStatus::Done.as_str()),
                        jobs::result_json.eq(result_json),
                        jobs::finished_at.eq(now),
                        jobs::duration_ms.eq(duration_ms),
                    ))
                    .execute(&mut conn)
                    .await?;
            }
            JobOutcome::Failed(msg) => {
                diesel::update(jobs::table.find(id))
                    .set((
                        jobs::status.eq(JobStatus::Failed.as_str()),
                        jobs::error.eq(msg),
                        jobs::finished_at.eq(now),
                        jobs::duration_ms.eq(duration_ms),
                    ))
                    .execute(&mut conn)
                    .await?;
            }
            JobOutcome::Canceled(msg) => {
                diesel::update(jobs::table.find(id))
                    .set((
                        jobs::status.eq(JobStatus::Canceled.as_str()),
                        jobs::error.eq(msg),
                        jobs::finished_at.eq(now),
                        jobs::duration_ms.eq(duration_ms),
                    ))
                    .execute(&mut conn)
                    .await?;
            }
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> DbResult<Option<JobRecord>> {
        let mut conn = self.conn().await?;
        let row: Option<JobRow> = jobs::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(DbError::from)?;
        row.map(row_to_record).transpose()
    }

    async fn cancel(&self, id: &str) -> DbResult<CancelOutcome> {
        let mut conn = self.conn().await?;
        let now = Utc::now();

        let updated = diesel::update(jobs::table.find(id).filter(jobs::status.eq("pending")))
            .set((
                jobs::status.eq(JobStatus::Canceled.as_str()),
                jobs::error.eq(""),
                jobs::finished_at.eq(now),
            ))
            .execute(&mut conn)
            .await?;

        if updated > 0 {
            return Ok(CancelOutcome::Cancelled);
        }

        // Not pending: either running/terminal already, or the id doesn't
        // exist at all. Distinguish only for the 404 case.
        let exists = jobs::table.find(id).first::<JobRow>(&mut conn).await.optional()?.is_some();
        Ok(if exists {
            CancelOutcome::Cancelled
        } else {
            CancelOutcome::NotFound
        })
    }

    async fn active_count(&self) -> DbResult<u64> {
        let mut conn = self.conn().await?;
        let count: i64 = jobs::table
            .filter(jobs::status.eq_any(["pending", "running"]))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count as u64)
    }

    async fn pool_state(&self) -> Option<PoolState> {
        let status = self.pool.status();
        Some(PoolState {
            size: status.size as u32,
            available: status.available as i64,
        })
    }
}
