//! Per-back-end sample history

use super::stats::LoadStats;
use std::collections::VecDeque;

/// Bounded load-time history plus attempt counters for one back-end
///
/// Invariants: `late_count <= total_count` and `samples.len() <= capacity`.
/// Derived statistics are memoized and dropped on every new sample.
#[derive(Debug, Clone)]
pub struct BackendProfile {
    samples: VecDeque<f64>,
    capacity: usize,
    total_count: u64,
    late_count: u64,
    cache: Option<LoadStats>,
}

impl BackendProfile {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
            total_count: 0,
            late_count: 0,
            cache: None,
        }
    }

    /// Append a sample, evicting the oldest beyond capacity
    pub fn push(&mut self, elapsed_ms: f64) {
        self.samples.push_back(elapsed_ms);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.total_count += 1;
        self.cache = None;
    }

    /// Count a late attempt; returns false if it would exceed the attempt count
    pub fn mark_late(&mut self) -> bool {
        if self.late_count >= self.total_count {
            return false;
        }
        self.late_count += 1;
        true
    }

    /// Statistics over the current window, computed at most once per sample
    pub fn stats(&mut self) -> Option<LoadStats> {
        if self.cache.is_none() {
            let window: Vec<f64> = self.samples.iter().copied().collect();
            self.cache = LoadStats::from_samples(&window);
        }
        self.cache
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn late_count(&self) -> u64 {
        self.late_count
    }

    /// Fraction of attempts that were late (0 with no attempts)
    pub fn late_rate(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.late_count as f64 / self.total_count as f64
        }
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self) -> bool {
        self.cache.is_some()
    }
}
