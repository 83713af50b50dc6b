//! Timing statistics over a sample of pass durations. Deliberately hand
//! rolled rather than pulled from a stats crate — five numbers from a small
//! `Vec<f64>` isn't worth a new dependency.

use crate::types::TimingStats;

pub fn compute(samples_ms: &[f64]) -> TimingStats {
    assert!(!samples_ms.is_empty(), "compute() requires at least one sample");

    let mut sorted = samples_ms.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let min_ms = sorted[0];
    let max_ms = *sorted.last().unwrap();
    let mean_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;
    let median_ms = median(&sorted);
    let variance = sorted.iter().map(|x| (x - mean_ms).powi(2)).sum::<f64>() / sorted.len() as f64;
    let stddev_ms = variance.sqrt();

    TimingStats {
        median_ms,
        mean_ms,
        min_ms,
        max_ms,
        stddev_ms,
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sample() {
        let stats = compute(&[5.0]);
        assert_eq!(stats.median_ms, 5.0);
        assert_eq!(stats.mean_ms, 5.0);
        assert_eq!(stats.min_ms, 5.0);
        assert_eq!(stats.max_ms, 5.0);
        assert_eq!(stats.stddev_ms, 0.0);
    }

    #[test]
    fn odd_and_even_medians() {
        let odd = compute(&[3.0, 1.0, 2.0]);
        assert_eq!(odd.median_ms, 2.0);

        let even = compute(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(even.median_ms, 2.5);
    }
}
