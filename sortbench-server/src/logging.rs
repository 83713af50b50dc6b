//! Structured logging (SPEC_FULL.md §4/C10): `tracing` + `tracing-subscriber`,
//! JSON or human-readable by `settings.human_logs`, level by `LOG_LEVEL`.
//! Plays the role of the teacher's `syncserver::logging::init_logging`, but
//! built on `tracing` end to end rather than bridging from `slog` — the
//! rest of this workspace already logs through `tracing::*` call sites, so
//! there is no `slog` layer left to bridge (recorded in DESIGN.md as a
//! dropped dependency).

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. The returned guard must be held for the
/// life of the process — dropping it early truncates buffered log lines.
pub fn init_logging(log_level: &str, human_logs: bool) -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = fmt().with_env_filter(filter).with_writer(writer);

    if human_logs {
        subscriber.pretty().init();
    } else {
        subscriber.json().flatten_event(true).init();
    }

    guard
}
