//! HTTP handlers (spec.md §6). Grouped the way the teacher splits
//! `syncstorage-web::handlers` by concern rather than one flat file.

pub mod jobs;
pub mod meta;
pub mod ops;
pub mod run;
