//! The sort-benchmarking core: deterministic input generation, built-in and
//! plugin-provided sort algorithms, timing, and the `Engine` contract that
//! ties them together. Has no knowledge of HTTP, the job queue, or rate
//! limiting — those live in `sortbench-web` and `sortbench-db`.

pub mod algorithms;
pub mod gen;
pub mod plugins;
mod run;
pub mod stats;
pub mod types;

pub use plugins::PluginLoader;
pub use run::{list_algorithms, run};
pub use types::{
    DistributionTunables, ElemType, EngineCall, EngineError, ResultRow, TimingStats, DEFAULT_SEED,
};
pub use types::Distribution;
