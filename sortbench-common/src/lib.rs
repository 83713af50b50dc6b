//! Shared error traits, metrics plumbing, and small utilities used across
//! every other crate in the workspace.

pub mod metrics;

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use actix_web::{error::BlockingError, web};

pub use metrics::{install_prometheus, PrometheusHandleHolder};

/// Request bodies larger than this are rejected before JSON parsing.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Types that can describe themselves for Sentry-style reporting. Unused
/// fields here (beyond what this service needs) are trimmed relative to the
/// teacher's broader `ReportableError`.
pub trait ReportableError: fmt::Debug {
    fn error_backtrace(&self) -> String;
    fn is_sentry_event(&self) -> bool;
    fn metric_label(&self) -> Option<String>;
}

/// Types that can represent an internal/unexpected failure constructed from
/// a plain message, used by `BlockingThreadpool::spawn`'s cancellation path.
pub trait InternalError {
    fn internal_error(message: String) -> Self;
}

#[macro_export]
macro_rules! from_error {
    ($from:ty, $to:ty, $to_kind:expr) => {
        impl From<$from> for $to {
            fn from(inner: $from) -> $to {
                $to_kind(inner).into()
            }
        }
    };
}

/// A threadpool on which callers can spawn blocking (non-async) work, such
/// as a CPU-bound timing loop, without pinning a Tokio worker thread.
/// Intentionally does not implement `Clone` — instantiate once and share via
/// `Arc`.
#[derive(Debug, Default)]
pub struct BlockingThreadpool {
    spawned_tasks: AtomicU64,
}

impl BlockingThreadpool {
    pub async fn spawn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: fmt::Debug + Send + InternalError + 'static,
    {
        self.spawned_tasks.fetch_add(1, Ordering::Relaxed);

        let result = match web::block(f).await {
            Ok(inner) => inner,
            Err(BlockingError) => Err(E::internal_error(
                "blocking threadpool task panicked".to_owned(),
            )),
        };

        self.spawned_tasks.fetch_sub(1, Ordering::Relaxed);
        result
    }

    pub fn active_threads(&self) -> u64 {
        self.spawned_tasks.load(Ordering::Relaxed)
    }
}
