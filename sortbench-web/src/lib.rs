//! The HTTP surface: validation, rate limiting, auth, the sync executor,
//! job endpoints, metadata, and operational routes (spec.md §4.1–§4.3,
//! §4.6, §4.9, §4.12). Mirrors the teacher's `syncserver`/`syncstorage-web`
//! split, narrowed to one crate since this service has no Sync-1.1/BSO
//! surface to separate out.

pub mod app;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ratelimit;
pub mod state;
pub mod validate;

pub use state::AppState;
