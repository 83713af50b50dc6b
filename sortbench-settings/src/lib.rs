//! Environment-driven configuration, the same `config`-crate pattern the
//! teacher uses in `syncserver-settings` (an `Environment` source merged
//! over `#[serde(default)]` struct defaults) narrowed to env-vars-only: this
//! service has no config-file concept, so the teacher's `File` source and
//! `--config` CLI flag are dropped (see DESIGN.md).

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Caps and knobs controlling request admission, job concurrency, and the
/// token-bucket rate limiter. All fields are optional in the environment;
/// defaults below match spec.md §6.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub host: String,

    /// Upper bound on requested array size `N`.
    pub max_n: u64,
    /// Upper bound on `repeats`.
    pub max_repeats: u32,
    /// Upper bound on `threads`, when the caller requests a specific count.
    pub max_threads: u32,
    /// Maximum number of jobs simultaneously in `{pending, running}`.
    pub max_jobs: u64,
    /// Server-side deadline cap, in milliseconds; a request's own
    /// `timeout_ms` is clamped to this.
    pub timeout_ms: u64,
    /// Worker task count for durable (DB-backed) job dispatch.
    pub workers: usize,

    /// Token bucket refill rate, tokens per minute.
    pub rate_limit_r: f64,
    /// Token bucket capacity (burst size).
    pub rate_limit_b: f64,
    /// Whether to trust `X-Forwarded-For`'s first entry as client identity.
    pub trust_xff: bool,

    pub log_level: String,
    /// Render JSON logs (production) instead of pretty human-readable ones.
    pub human_logs: bool,

    /// Comma-separated API keys, in addition to any loaded from a file.
    pub api_keys: Option<String>,
    /// Path to a file of newline-separated API keys.
    pub api_keys_file: Option<String>,

    /// When set, enables durable (DB-backed) job mode.
    pub database_url: Option<String>,
    pub db_max_conns: u32,

    /// Engine-selection vars accepted for interface completeness; this
    /// build only ships the in-process engine collaborator (see
    /// DESIGN.md's Open Question decision), so a non-empty value here only
    /// affects a startup warning and the `/limits` `mode` field never
    /// becomes anything but `"in-process"`.
    pub engine_bin: Option<String>,
    pub engine_cgo: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "127.0.0.1".to_owned(),
            max_n: 10_000_000,
            max_repeats: 100,
            max_threads: num_cpus::get() as u32,
            max_jobs: 64,
            timeout_ms: 30_000,
            workers: 4,
            rate_limit_r: 120.0,
            rate_limit_b: 60.0,
            trust_xff: false,
            log_level: "info".to_owned(),
            human_logs: true,
            api_keys: None,
            api_keys_file: None,
            database_url: None,
            db_max_conns: 10,
            engine_bin: None,
            engine_cgo: false,
        }
    }
}

impl Settings {
    /// Loads settings from the process environment. All variables are
    /// optional; any that are absent take the `Default` above.
    pub fn from_env() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Whether durable (DB-backed) job mode is configured.
    pub fn durable_mode(&self) -> bool {
        self.database_url.is_some()
    }

    /// Human-readable one-liner logged at startup.
    pub fn banner(&self) -> String {
        format!(
            "{}:{} (mode={}, max_jobs={}, workers={})",
            self.host,
            self.port,
            if self.durable_mode() { "durable" } else { "in-memory" },
            self.max_jobs,
            self.workers,
        )
    }

    #[cfg(debug_assertions)]
    pub fn test_settings() -> Self {
        let mut settings = Self::default();
        settings.port = 0;
        settings.max_jobs = 8;
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let s = Settings::default();
        assert_eq!(s.port, 8000);
        assert_eq!(s.max_jobs, 64);
        assert!(!s.durable_mode());
    }

    #[test]
    fn durable_mode_follows_database_url() {
        let mut s = Settings::default();
        assert!(!s.durable_mode());
        s.database_url = Some("postgres://localhost/sortbench".to_owned());
        assert!(s.durable_mode());
    }
}
