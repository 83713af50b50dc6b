//! Row types for the `jobs` table. `request_json`/`result_json` carry the
//! full structures; the denormalized scalar columns (`dist`, `elem_type`,
//! `repeats`, `threads`, `baseline`, `algos`, `mode`) exist so operators can
//! query/index on them without reaching into JSONB, per spec.md §4.7/§6's
//! literal column list.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

use super::schema::jobs;

/// The engine execution mode recorded on every row. This build only ever
/// implements the in-process collaborator (see DESIGN.md's Open Question
/// decision), so the column's value never varies — it's still stored
/// because spec.md §4.7 names it as a persisted column.
pub const ENGINE_MODE: &str = "in-process";

/// Queryable both through the normal query DSL and through the raw
/// `sql_query` the lease transaction uses to express `FOR UPDATE SKIP
/// LOCKED`, which diesel's DSL has no portable method for.
#[derive(Queryable, QueryableByName, Identifiable, Debug)]
#[diesel(table_name = jobs)]
pub struct JobRow {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub id: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub status: String,
    #[diesel(sql_type = diesel::sql_types::Jsonb)]
    pub request_json: Value,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Jsonb>)]
    pub result_json: Option<Value>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub error: Option<String>,
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Timestamptz>)]
    pub started_at: Option<DateTime<Utc>>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Timestamptz>)]
    pub finished_at: Option<DateTime<Utc>>,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::BigInt>)]
    pub duration_ms: Option<i64>,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub dist: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub elem_type: String,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub repeats: i32,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub threads: i32,
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Text>)]
    pub baseline: Option<String>,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub algos: String,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub mode: String,
}

#[derive(Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJobRow {
    pub id: String,
    pub status: String,
    pub request_json: Value,
    pub created_at: DateTime<Utc>,
    pub dist: String,
    pub elem_type: String,
    pub repeats: i32,
    pub threads: i32,
    pub baseline: Option<String>,
    pub algos: String,
    pub mode: String,
}
