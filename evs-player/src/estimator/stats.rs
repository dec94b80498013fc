//! Load-time statistics
//!
//! **Purpose:** Summarize a window of load-time samples (milliseconds) into
//! the figures the look-ahead policy needs.

use serde::{Deserialize, Serialize};

/// Derived statistics over one back-end's sample window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Mean load time in milliseconds
    pub mean_ms: f64,

    /// Population standard deviation in milliseconds (0 for fewer than 2 samples)
    pub std_dev_ms: f64,

    /// 95th percentile (nearest rank) in milliseconds
    pub p95_ms: f64,
}

impl LoadStats {
    /// Compute statistics from samples, or `None` for an empty window
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        Some(Self {
            mean_ms: mean(samples),
            std_dev_ms: population_std_dev(samples),
            p95_ms: nearest_rank_percentile(samples, 0.95)?,
        })
    }
}

/// Arithmetic mean (0 for an empty slice)
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation: divides by n, and is 0 below 2 samples
pub fn population_std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }

    let mean = mean(samples);
    let variance = samples
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;

    variance.sqrt()
}

/// Nearest-rank percentile without interpolation
///
/// Picks the ascending-sorted sample at `floor(n * percentile)`, clamped to
/// the last index.
pub fn nearest_rank_percentile(samples: &[f64], percentile: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let idx = (sorted.len() as f64 * percentile).floor().max(0.0) as usize;
    sorted.get(idx.min(sorted.len() - 1)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p95_nearest_rank() {
        let samples: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        // floor(10 * 0.95) = 9 -> value 10
        assert_eq!(nearest_rank_percentile(&samples, 0.95), Some(10.0));
    }

    #[test]
    fn test_percentile_ignores_insertion_order() {
        let samples = vec![900.0, 100.0, 500.0, 300.0];
        // floor(4 * 0.5) = 2 -> sorted [100, 300, 500, 900] -> 500
        assert_eq!(nearest_rank_percentile(&samples, 0.5), Some(500.0));
        assert_eq!(nearest_rank_percentile(&samples, 1.0), Some(900.0));
        assert_eq!(nearest_rank_percentile(&[], 0.95), None);
    }

    #[test]
    fn test_std_dev_population_formula() {
        assert_eq!(population_std_dev(&[10.0, 10.0, 10.0, 10.0]), 0.0);
        assert_eq!(population_std_dev(&[0.0, 0.0, 0.0, 0.0, 10.0]), 4.0);
        assert_eq!(population_std_dev(&[42.0]), 0.0);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn test_load_stats() {
        let stats = LoadStats::from_samples(&[100.0, 200.0, 300.0]).unwrap();
        assert_eq!(stats.mean_ms, 200.0);
        assert!((stats.std_dev_ms - 81.649_658).abs() < 1e-3);
        assert_eq!(stats.p95_ms, 300.0);

        assert!(LoadStats::from_samples(&[]).is_none());
    }
}
