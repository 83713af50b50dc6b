//! Request validation and engine-argument construction (spec.md §4.1, C1):
//! bounds-check every numeric field, membership-check the enumerated ones,
//! and translate into an `EngineCall`. The translation is total and
//! deterministic — unknown algorithm/baseline names are tolerated (the
//! engine produces no row for them) rather than rejected, since strict mode
//! is explicitly not the default per spec.md §4.1.

use serde::Deserialize;
use sortbench_engine::{DistributionTunables, ElemType, EngineCall, DEFAULT_SEED};
use sortbench_settings::Settings;
use validator::Validate;

use crate::error::ApiError;

/// The wire shape of a benchmark request, spec.md §3. Unknown JSON fields
/// are ignored (the default for `serde` without `deny_unknown_fields`).
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default)]
pub struct BenchmarkRequest {
    #[validate(range(min = 1))]
    pub n: u64,
    pub distribution: String,
    pub elem_type: String,
    #[validate(range(max = 100_000))]
    pub repeats: u32,
    pub warmup: u32,
    pub seed: Option<u64>,
    pub threads: u32,
    pub assert_sorted: bool,
    pub baseline: Option<String>,
    pub algorithms: Vec<String>,
    pub plugins: Vec<String>,
    pub timeout_ms: Option<u64>,
    #[serde(flatten)]
    pub tunables: DistributionTunables,
}

impl Default for BenchmarkRequest {
    fn default() -> Self {
        Self {
            n: 0,
            distribution: String::new(),
            elem_type: String::new(),
            repeats: 1,
            warmup: 0,
            seed: None,
            threads: 0,
            assert_sorted: false,
            baseline: None,
            algorithms: Vec::new(),
            plugins: Vec::new(),
            timeout_ms: None,
            tunables: DistributionTunables::default(),
        }
    }
}

fn parse_elem_type(s: &str) -> Result<ElemType, ApiError> {
    ElemType::ALL
        .into_iter()
        .find(|t| t.as_str() == s)
        .ok_or_else(|| ApiError::validation("invalid elem_type"))
}

fn parse_distribution(s: &str) -> Result<sortbench_engine::Distribution, ApiError> {
    sortbench_engine::Distribution::ALL
        .into_iter()
        .find(|d| d.as_str() == s)
        .ok_or_else(|| ApiError::validation("invalid dist"))
}

/// Bounds-checks a request against the server's caps and builds the
/// canonical engine invocation in one pass — the caps (`MaxN`, `MaxRepeats`,
/// `MaxThreads`) live outside the derive-time `#[validate]` attributes
/// because they're runtime configuration, not compile-time constants.
pub fn build_engine_args(request: &BenchmarkRequest, caps: &Settings) -> Result<EngineCall, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    if request.n > caps.max_n {
        return Err(ApiError::validation(format!("N must be in [1,{}]", caps.max_n)));
    }
    if request.repeats > caps.max_repeats {
        return Err(ApiError::validation(format!(
            "repeats must be in [0,{}]",
            caps.max_repeats
        )));
    }
    if caps.max_threads > 0 && request.threads > caps.max_threads {
        return Err(ApiError::validation(format!(
            "threads must be in [0,{}]",
            caps.max_threads
        )));
    }

    let distribution = parse_distribution(&request.distribution)?;
    let elem_type = parse_elem_type(&request.elem_type)?;

    Ok(EngineCall {
        n: request.n,
        distribution,
        elem_type,
        repeats: request.repeats,
        warmup: request.warmup,
        seed: request.seed.unwrap_or(DEFAULT_SEED),
        threads: request.threads,
        assert_sorted: request.assert_sorted,
        baseline: request.baseline.clone(),
        algorithms: request.algorithms.clone(),
        plugins: request.plugins.iter().map(Into::into).collect(),
        tunables: request.tunables,
    })
}

/// The deadline a sync run actually uses: the request's own `timeout_ms`,
/// clamped never to exceed the server cap (spec.md §5, "request-supplied
/// `timeout_ms` does not extend it beyond the server cap").
pub fn effective_timeout_ms(request: &BenchmarkRequest, caps: &Settings) -> u64 {
    request
        .timeout_ms
        .map_or(caps.timeout_ms, |t| t.min(caps.timeout_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> Settings {
        Settings::test_settings()
    }

    fn valid_request() -> BenchmarkRequest {
        BenchmarkRequest {
            n: 256,
            distribution: "runs".to_owned(),
            elem_type: "i32".to_owned(),
            repeats: 1,
            algorithms: vec!["std_sort".to_owned()],
            assert_sorted: true,
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_well_formed_request() {
        let call = build_engine_args(&valid_request(), &caps()).expect("should validate");
        assert_eq!(call.n, 256);
        assert_eq!(call.elem_type, ElemType::I32);
    }

    #[test]
    fn rejects_n_zero() {
        let mut req = valid_request();
        req.n = 0;
        let err = build_engine_args(&req, &caps()).unwrap_err();
        assert_eq!(err.status, actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejects_n_above_cap() {
        let mut req = valid_request();
        let caps = caps();
        req.n = caps.max_n + 1;
        assert!(build_engine_args(&req, &caps).is_err());
    }

    #[test]
    fn accepts_n_at_cap() {
        let mut req = valid_request();
        let caps = caps();
        req.n = caps.max_n;
        assert!(build_engine_args(&req, &caps).is_ok());
    }

    #[test]
    fn rejects_invalid_distribution() {
        let mut req = valid_request();
        req.distribution = "swirl".to_owned();
        assert!(build_engine_args(&req, &caps()).is_err());
    }

    #[test]
    fn empty_algorithms_is_accepted_as_select_all() {
        let mut req = valid_request();
        req.algorithms = Vec::new();
        let call = build_engine_args(&req, &caps()).expect("empty algos means all");
        assert!(call.algorithms.is_empty());
    }

    #[test]
    fn default_seed_applied_when_absent() {
        let req = valid_request();
        let call = build_engine_args(&req, &caps()).unwrap();
        assert_eq!(call.seed, DEFAULT_SEED);
    }

    #[test]
    fn sync_timeout_is_clamped_to_server_cap() {
        let mut req = valid_request();
        let caps = caps();
        req.timeout_ms = Some(caps.timeout_ms * 10);
        assert_eq!(effective_timeout_ms(&req, &caps), caps.timeout_ms);
    }
}
