//! Generated-by-hand `table!` declaration (no `diesel print-schema` run in
//! this environment — the toolchain is never invoked here), matching
//! `2024-01-01-000001_create_jobs/up.sql` field for field.

diesel::table! {
    use diesel::sql_types::*;

    jobs (id) {
        id -> Text,
        status -> Text,
        request_json -> Jsonb,
        result_json -> Nullable<Jsonb>,
        error -> Nullable<Text>,
        created_at -> Timestamptz,
        started_at -> Nullable<Timestamptz>,
        finished_at -> Nullable<Timestamptz>,
        duration_ms -> Nullable<BigInt>,
        dist -> Text,
        elem_type -> Text,
        repeats -> Integer,
        threads -> Integer,
        baseline -> Nullable<Text>,
        algos -> Text,
        mode -> Text,
    }
}
