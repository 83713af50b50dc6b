pub mod metrics;

pub use metrics::MetricsWrapper;
