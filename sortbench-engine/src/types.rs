//! The data model the orchestrator and engine agree on. Kept separate from
//! `sortbench-web`'s request types so the engine crate has no HTTP
//! dependency at all — it only understands requests, not routes.

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The seven element types the engine can sort. Deliberately a flat,
/// exhaustively-matched enum rather than a trait object hierarchy — per
/// spec.md §9, "prefer tagged enumerations... over inheritance."
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElemType {
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Str,
}

impl ElemType {
    pub const ALL: [ElemType; 7] = [
        ElemType::I32,
        ElemType::U32,
        ElemType::I64,
        ElemType::U64,
        ElemType::F32,
        ElemType::F64,
        ElemType::Str,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElemType::I32 => "i32",
            ElemType::U32 => "u32",
            ElemType::I64 => "i64",
            ElemType::U64 => "u64",
            ElemType::F32 => "f32",
            ElemType::F64 => "f64",
            ElemType::Str => "str",
        }
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The thirteen named input-generation strategies.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Random,
    Sorted,
    ReverseSorted,
    NearlySorted,
    Runs,
    Zipf,
    Duplicates,
    AllEqual,
    PartialShuffle,
    Sawtooth,
    Staggered,
    Gaussian,
    OrganPipe,
}

impl Distribution {
    pub const ALL: [Distribution; 13] = [
        Distribution::Random,
        Distribution::Sorted,
        Distribution::ReverseSorted,
        Distribution::NearlySorted,
        Distribution::Runs,
        Distribution::Zipf,
        Distribution::Duplicates,
        Distribution::AllEqual,
        Distribution::PartialShuffle,
        Distribution::Sawtooth,
        Distribution::Staggered,
        Distribution::Gaussian,
        Distribution::OrganPipe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Distribution::Random => "random",
            Distribution::Sorted => "sorted",
            Distribution::ReverseSorted => "reverse_sorted",
            Distribution::NearlySorted => "nearly_sorted",
            Distribution::Runs => "runs",
            Distribution::Zipf => "zipf",
            Distribution::Duplicates => "duplicates",
            Distribution::AllEqual => "all_equal",
            Distribution::PartialShuffle => "partial_shuffle",
            Distribution::Sawtooth => "sawtooth",
            Distribution::Staggered => "staggered",
            Distribution::Gaussian => "gaussian",
            Distribution::OrganPipe => "organ_pipe",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distribution tunables, all optional and default-valued per spec.md §3.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionTunables {
    pub partial_shuffle_pct: f64,
    pub dup_values: u32,
    pub zipf_s: f64,
    pub runs_alpha: f64,
    pub stagger_block: u32,
}

impl Default for DistributionTunables {
    fn default() -> Self {
        Self {
            partial_shuffle_pct: 0.1,
            dup_values: 16,
            zipf_s: 1.1,
            runs_alpha: 0.5,
            stagger_block: 32,
        }
    }
}

/// A canonical, already-validated invocation of the engine. Distinct from
/// the HTTP-facing request type so the translation in the orchestrator
/// (`ArgBuilder::build_engine_args`) is the only place that bridges the two.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineCall {
    pub n: u64,
    pub distribution: Distribution,
    pub elem_type: ElemType,
    pub repeats: u32,
    pub warmup: u32,
    pub seed: u64,
    pub threads: u32,
    pub assert_sorted: bool,
    pub baseline: Option<String>,
    pub algorithms: Vec<String>,
    pub plugins: Vec<PathBuf>,
    pub tunables: DistributionTunables,
}

/// The default seed used when a request omits one — the engine is
/// deterministic given `(seed, request)`, per spec.md §4.4.
pub const DEFAULT_SEED: u64 = 0x5317_0000_0000_1001;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingStats {
    pub median_ms: f64,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub stddev_ms: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultRow {
    pub algo: String,
    pub n: u64,
    pub dist: Distribution,
    pub stats: TimingStats,
    pub speedup_vs_baseline: Option<f64>,
}

/// Engine failure kinds, per spec.md §3's Engine Invocation contract and §7.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("sort assertion failed for algorithm {algo}: output is not sorted")]
    SortAssertion { algo: String },
    #[error("plugin load error: {0}")]
    PluginLoad(String),
    #[error("internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn kind_str(&self) -> &'static str {
        match self {
            EngineError::InvalidConfig(_) => "invalid-config",
            EngineError::SortAssertion { .. } => "sort-assertion",
            EngineError::PluginLoad(_) => "plugin-load",
            EngineError::Internal(_) => "internal",
        }
    }
}
