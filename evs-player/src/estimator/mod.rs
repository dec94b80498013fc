//! Adaptive look-ahead estimation
//!
//! Learns load-time distributions per back-end and recommends how far ahead
//! of the requested position a surface should start buffering, so that by
//! the time the load latency has elapsed it is already at the right frame.
//!
//! # Policy
//!
//! - Fewer than [`MIN_SAMPLES`] samples: the back-end's default look-ahead.
//! - Otherwise `(p95 + std_dev * safety_margin) / 1000` seconds.
//! - More than [`LATE_ESCALATION_MIN_ATTEMPTS`] attempts with a late rate above
//!   [`LATE_RATE_THRESHOLD`]: multiply by [`LATE_ESCALATION_FACTOR`].
//! - Clamp to `[min_lookahead, max_lookahead]`.

pub mod profile;
pub mod quality;
pub mod report;
pub mod stats;

pub use profile::BackendProfile;
pub use quality::QualityLabel;
pub use report::{BackendStats, ReportFormatter};
pub use stats::LoadStats;

use crate::backend::{BackendId, PerBackend};
use crate::config::{BackendConfig, TomlConfig};
use tracing::{debug, info, warn};

/// Samples required before learned statistics replace the default
pub const MIN_SAMPLES: usize = 3;

/// Attempts required before the late rate is trusted
pub const LATE_ESCALATION_MIN_ATTEMPTS: u64 = 5;

/// Late rate above which the look-ahead is escalated
pub const LATE_RATE_THRESHOLD: f64 = 0.10;

/// Escalation multiplier for structurally under-buffered back-ends
pub const LATE_ESCALATION_FACTOR: f64 = 1.2;

/// Per-back-end adaptive load-time statistics
///
/// Owned instance; share it behind a mutex when several tasks need it.
#[derive(Debug, Clone)]
pub struct LoadTimeEstimator {
    profiles: PerBackend<BackendProfile>,
    configs: PerBackend<BackendConfig>,
}

impl LoadTimeEstimator {
    /// Create an estimator with explicit history capacity and policies
    pub fn new(history_capacity: usize, configs: PerBackend<BackendConfig>) -> Self {
        Self {
            profiles: PerBackend::from_fn(|_| BackendProfile::new(history_capacity)),
            configs,
        }
    }

    /// Create an estimator from the loaded configuration
    pub fn from_config(config: &TomlConfig) -> Self {
        Self::new(
            config.history_capacity,
            PerBackend::from_fn(|b| config.backend_config(b)),
        )
    }

    pub fn config(&self, backend: BackendId) -> &BackendConfig {
        self.configs.get(backend)
    }

    pub fn profile(&self, backend: BackendId) -> &BackendProfile {
        self.profiles.get(backend)
    }

    /// Record how long a load took
    pub fn record_load_time(&mut self, backend: BackendId, elapsed_ms: f64) {
        let profile = self.profiles.get_mut(backend);
        profile.push(elapsed_ms.max(0.0));
        debug!(
            "[Network:{}] Load time recorded: {:.0}ms (samples: {})",
            backend,
            elapsed_ms,
            profile.len()
        );
    }

    /// Record that an attempt missed its wall-clock deadline
    pub fn record_late(&mut self, backend: BackendId, lateness_ms: f64) {
        let profile = self.profiles.get_mut(backend);
        if profile.mark_late() {
            info!(
                "[Network:{}] Late by {:.0}ms (late rate: {:.1}%)",
                backend,
                lateness_ms,
                profile.late_rate() * 100.0
            );
        } else {
            warn!(
                "[Network:{}] Late event without a recorded attempt ignored ({:.0}ms)",
                backend, lateness_ms
            );
        }
    }

    /// Recommended look-ahead in seconds
    pub fn recommended_lookahead(&mut self, backend: BackendId) -> f64 {
        let config = *self.configs.get(backend);
        let profile = self.profiles.get_mut(backend);

        if profile.len() < MIN_SAMPLES {
            return config.default_lookahead;
        }

        let stats = match profile.stats() {
            Some(stats) => stats,
            None => return config.default_lookahead,
        };

        let mut recommended = (stats.p95_ms + stats.std_dev_ms * config.safety_margin) / 1000.0;

        if profile.total_count() > LATE_ESCALATION_MIN_ATTEMPTS
            && profile.late_rate() > LATE_RATE_THRESHOLD
        {
            recommended *= LATE_ESCALATION_FACTOR;
            debug!(
                "[Network:{}] Late rate {:.1}%, escalating look-ahead",
                backend,
                profile.late_rate() * 100.0
            );
        }

        recommended.clamp(config.min_lookahead, config.max_lookahead)
    }

    /// Mean load time in ms; the default look-ahead stands in with no samples
    pub fn mean_load_time(&mut self, backend: BackendId) -> f64 {
        let fallback = self.configs.get(backend).default_lookahead * 1000.0;
        self.profiles
            .get_mut(backend)
            .stats()
            .map(|s| s.mean_ms)
            .unwrap_or(fallback)
    }

    /// Population standard deviation of load times in ms
    pub fn std_dev(&mut self, backend: BackendId) -> f64 {
        self.profiles
            .get_mut(backend)
            .stats()
            .map(|s| s.std_dev_ms)
            .unwrap_or(0.0)
    }

    /// Arbitrary nearest-rank percentile of load times in ms
    ///
    /// The 95th percentile is served from the cache; other percentiles are
    /// computed on demand.
    pub fn percentile(&mut self, backend: BackendId, percentile: f64) -> f64 {
        let fallback = self.configs.get(backend).default_lookahead * 1000.0;
        let profile = self.profiles.get_mut(backend);

        if percentile == 0.95 {
            return profile.stats().map(|s| s.p95_ms).unwrap_or(fallback);
        }

        let window: Vec<f64> = profile.samples().collect();
        stats::nearest_rank_percentile(&window, percentile).unwrap_or(fallback)
    }

    /// Quality label from the mean load time
    pub fn quality_label(&mut self, backend: BackendId) -> QualityLabel {
        let mean = self.mean_load_time(backend);
        QualityLabel::from_mean_load_time(mean, &self.configs.get(backend).quality_thresholds_ms)
    }

    /// Full statistics snapshot
    pub fn stats(&mut self, backend: BackendId) -> BackendStats {
        let quality = self.quality_label(backend);
        let recommended = self.recommended_lookahead(backend);
        let mean_ms = self.mean_load_time(backend);
        let std_dev_ms = self.std_dev(backend);
        let p95_ms = self.percentile(backend, 0.95);

        let profile = self.profiles.get(backend);
        let min_ms = profile.samples().reduce(f64::min);
        let max_ms = profile.samples().reduce(f64::max);

        BackendStats {
            backend,
            quality,
            sample_count: profile.len(),
            mean_ms,
            std_dev_ms,
            p95_ms,
            min_ms,
            max_ms,
            late_count: profile.late_count(),
            total_count: profile.total_count(),
            success_rate: report::success_rate(profile.late_count(), profile.total_count()),
            recommended_lookahead_seconds: recommended,
        }
    }

    /// Human-readable report for one back-end
    pub fn report(&mut self, backend: BackendId) -> String {
        ReportFormatter::format(&self.stats(backend))
    }
}

impl Default for LoadTimeEstimator {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}
