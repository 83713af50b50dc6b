//! Ties generation, algorithms, and plugins together into the engine
//! contract described in spec.md §4.4: `run()` and `list_algorithms()`.

use std::{cmp::Ordering, time::Instant};

use crate::{
    algorithms::{run_builtin, BUILTIN_ALGORITHMS},
    gen::{generate, GeneratedInput},
    plugins::{PluginAlgorithm, PluginLoader},
    stats,
    types::{ElemType, EngineCall, EngineError, ResultRow},
};

/// Runs one engine invocation end to end: generate input, run every
/// selected algorithm's warmup + timed passes, assemble result rows, and
/// fill in `speedup_vs_baseline` when a baseline was requested.
pub fn run(call: &EngineCall, plugin_loader: &PluginLoader) -> Result<Vec<ResultRow>, EngineError> {
    let repeats = call.repeats.max(1);
    let names: Vec<String> = if call.algorithms.is_empty() {
        BUILTIN_ALGORITHMS.iter().map(|(n, _)| n.to_string()).collect()
    } else {
        call.algorithms.clone()
    };

    let mut plugin_algos: Vec<PluginAlgorithm> = Vec::new();
    for path in &call.plugins {
        match plugin_loader.discover(path, call.elem_type) {
            Ok(algos) => plugin_algos.extend(algos),
            Err(e) => tracing::warn!(plugin = %path.display(), error = %e, "skipping plugin"),
        }
    }
    let find_plugin = |name: &str| plugin_algos.iter().find(|a| a.name == name);

    let base = generate(call.elem_type, call.distribution, call.n, call.seed, &call.tunables);
    let mut rows = Vec::new();

    macro_rules! run_numeric {
        ($base:expr, $ty:ty, $run_plugin:ident) => {{
            for name in &names {
                let is_builtin = BUILTIN_ALGORITHMS.iter().any(|(n, _)| *n == name.as_str());
                let stats = if is_builtin {
                    let name = name.clone();
                    time_generic::<$ty, _>(
                        $base,
                        |d| {
                            run_builtin(&name, d);
                        },
                        call.warmup,
                        repeats,
                        call.assert_sorted,
                        &name,
                    )?
                } else if let Some(plugin) = find_plugin(name) {
                    time_generic::<$ty, _>(
                        $base,
                        |d| plugin.$run_plugin(d),
                        call.warmup,
                        repeats,
                        call.assert_sorted,
                        name,
                    )?
                } else {
                    continue;
                };
                rows.push(ResultRow {
                    algo: name.clone(),
                    n: call.n,
                    dist: call.distribution,
                    stats,
                    speedup_vs_baseline: None,
                });
            }
        }};
    }

    match &base {
        GeneratedInput::I32(v) => run_numeric!(v, i32, run_i32),
        GeneratedInput::U32(v) => run_numeric!(v, u32, run_u32),
        GeneratedInput::I64(v) => run_numeric!(v, i64, run_i64),
        GeneratedInput::U64(v) => run_numeric!(v, u64, run_u64),
        GeneratedInput::F32(v) => run_numeric!(v, f32, run_f32),
        GeneratedInput::F64(v) => run_numeric!(v, f64, run_f64),
        GeneratedInput::Str(v) => {
            // Plugins only expose numeric entry points (spec.md §4.5), so
            // `str` only ever dispatches to built-ins.
            for name in &names {
                if !BUILTIN_ALGORITHMS.iter().any(|(n, _)| *n == name.as_str()) {
                    continue;
                }
                let name_owned = name.clone();
                let stats = time_generic::<String, _>(
                    v,
                    |d| {
                        run_builtin(&name_owned, d);
                    },
                    call.warmup,
                    repeats,
                    call.assert_sorted,
                    name,
                )?;
                rows.push(ResultRow {
                    algo: name.clone(),
                    n: call.n,
                    dist: call.distribution,
                    stats,
                    speedup_vs_baseline: None,
                });
            }
        }
    }

    if let Some(baseline_name) = &call.baseline {
        if let Some(baseline_median) = rows
            .iter()
            .find(|r| &r.algo == baseline_name)
            .map(|r| r.stats.median_ms)
        {
            for row in rows.iter_mut() {
                row.speedup_vs_baseline = Some(if row.stats.median_ms > 0.0 {
                    baseline_median / row.stats.median_ms
                } else {
                    1.0
                });
            }
        }
    }

    Ok(rows)
}

/// Lists algorithm names available for `elem_type`, built-ins first, then
/// any discovered from `plugins` (scoped to this call only, per spec.md
/// §4.12 — plugin handles never persist across requests on this path).
pub fn list_algorithms(elem_type: ElemType, plugins: &[std::path::PathBuf]) -> Vec<String> {
    let loader = PluginLoader::new();
    let mut names: Vec<String> = BUILTIN_ALGORITHMS.iter().map(|(n, _)| n.to_string()).collect();
    if elem_type == ElemType::Str {
        return names;
    }
    for path in plugins {
        if let Ok(algos) = loader.discover(path, elem_type) {
            for algo in algos {
                if !names.contains(&algo.name) {
                    names.push(algo.name);
                }
            }
        }
    }
    names
}

fn time_generic<T, F>(
    base: &[T],
    mut sort: F,
    warmup: u32,
    repeats: u32,
    assert_sorted: bool,
    algo_name: &str,
) -> Result<crate::types::TimingStats, EngineError>
where
    T: Clone + PartialOrd,
    F: FnMut(&mut [T]),
{
    for _ in 0..warmup {
        let mut buf = base.to_vec();
        sort(&mut buf);
    }

    let mut samples_ms = Vec::with_capacity(repeats as usize);
    for _ in 0..repeats {
        let mut buf = base.to_vec();
        let start = Instant::now();
        sort(&mut buf);
        samples_ms.push(start.elapsed().as_secs_f64() * 1000.0);

        if assert_sorted && !is_sorted(&buf) {
            return Err(EngineError::SortAssertion {
                algo: algo_name.to_owned(),
            });
        }
    }

    Ok(stats::compute(&samples_ms))
}

fn is_sorted<T: PartialOrd>(data: &[T]) -> bool {
    data.windows(2)
        .all(|w| w[0].partial_cmp(&w[1]).map(|o| o != Ordering::Greater).unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DistributionTunables, Distribution};

    fn call(algorithms: Vec<&str>) -> EngineCall {
        EngineCall {
            n: 256,
            distribution: Distribution::Runs,
            elem_type: ElemType::I32,
            repeats: 1,
            warmup: 0,
            seed: crate::types::DEFAULT_SEED,
            threads: 0,
            assert_sorted: true,
            baseline: None,
            algorithms: algorithms.into_iter().map(str::to_owned).collect(),
            plugins: vec![],
            tunables: DistributionTunables::default(),
        }
    }

    #[test]
    fn produces_one_row_per_selected_algorithm() {
        let loader = PluginLoader::new();
        let rows = run(&call(vec!["std_sort"]), &loader).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].algo, "std_sort");
        assert_eq!(rows[0].n, 256);
        assert!(rows[0].stats.median_ms >= 0.0);
    }

    #[test]
    fn empty_algorithms_selects_all_builtins() {
        let loader = PluginLoader::new();
        let rows = run(&call(vec![]), &loader).unwrap();
        assert_eq!(rows.len(), BUILTIN_ALGORITHMS.len());
    }

    #[test]
    fn unknown_algorithm_name_produces_no_row() {
        let loader = PluginLoader::new();
        let rows = run(&call(vec!["not_a_real_algorithm"]), &loader).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn baseline_speedup_is_one_for_the_baseline_itself() {
        let loader = PluginLoader::new();
        let mut c = call(vec!["std_sort", "insertion_sort"]);
        c.baseline = Some("std_sort".to_owned());
        let rows = run(&c, &loader).unwrap();
        let baseline_row = rows.iter().find(|r| r.algo == "std_sort").unwrap();
        assert_eq!(baseline_row.speedup_vs_baseline, Some(1.0));
    }

    #[test]
    fn deterministic_given_same_seed_and_request() {
        let loader = PluginLoader::new();
        let a = run(&call(vec!["std_sort"]), &loader).unwrap();
        let b = run(&call(vec!["std_sort"]), &loader).unwrap();
        // Timing varies, but both runs sort the identical generated input
        // and must produce the same row count / algo / n.
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].algo, b[0].algo);
        assert_eq!(a[0].n, b[0].n);
    }
}
