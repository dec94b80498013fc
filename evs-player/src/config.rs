//! Configuration management for evs-player
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --config)
//! 2. Environment variables (EVS_PORT, EVS_CONFIG)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! Every TOML field is optional. Per-back-end sections only override the
//! fields they name; the rest keep that back-end's built-in defaults.

use crate::backend::BackendId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Look-ahead policy for one back-end
///
/// Durations are in seconds; quality thresholds are mean load times in ms
/// separating excellent / good / fair / poor / bad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackendConfig {
    pub min_lookahead: f64,
    pub max_lookahead: f64,
    pub default_lookahead: f64,
    pub safety_margin: f64,
    pub quality_thresholds_ms: [f64; 4],
}

impl BackendConfig {
    /// Built-in defaults for a back-end
    pub fn for_backend(backend: BackendId) -> Self {
        match backend {
            BackendId::YouTube => Self {
                min_lookahead: 0.5,
                max_lookahead: 5.0,
                default_lookahead: 1.5,
                safety_margin: 1.2,
                quality_thresholds_ms: [500.0, 1000.0, 2000.0, 4000.0],
            },
            // Structurally slower; wider range and looser quality bands
            BackendId::Bilibili => Self {
                min_lookahead: 2.0,
                max_lookahead: 15.0,
                default_lookahead: 4.0,
                safety_margin: 1.5,
                quality_thresholds_ms: [2000.0, 4000.0, 6000.0, 10000.0],
            },
        }
    }

    /// Check `0 < min <= default <= max`, a positive margin and ascending thresholds
    pub fn validate(&self, backend: BackendId) -> Result<()> {
        let values = [
            self.min_lookahead,
            self.max_lookahead,
            self.default_lookahead,
            self.safety_margin,
        ];
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(Error::Config(format!(
                "{}: look-ahead values and safety margin must be positive",
                backend
            )));
        }
        if !(self.min_lookahead <= self.default_lookahead
            && self.default_lookahead <= self.max_lookahead)
        {
            return Err(Error::Config(format!(
                "{}: expected min_lookahead <= default_lookahead <= max_lookahead, got {} / {} / {}",
                backend, self.min_lookahead, self.default_lookahead, self.max_lookahead
            )));
        }
        if self.quality_thresholds_ms.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::Config(format!(
                "{}: quality thresholds must be ascending",
                backend
            )));
        }
        Ok(())
    }
}

/// Per-back-end surface timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSettings {
    /// Fixed buffering wait for back-ends without a readiness signal
    pub buffer_wait: Duration,
    /// Upper bound on waiting for a readiness signal
    pub ready_timeout: Duration,
}

impl SurfaceSettings {
    pub fn for_backend(backend: BackendId) -> Self {
        match backend {
            BackendId::YouTube => Self {
                buffer_wait: Duration::ZERO,
                ready_timeout: Duration::from_secs(10),
            },
            BackendId::Bilibili => Self {
                buffer_wait: Duration::from_millis(2000),
                ready_timeout: Duration::from_secs(10),
            },
        }
    }
}

/// Optional per-back-end overrides as written in TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendOverrides {
    pub min_lookahead: Option<f64>,
    pub max_lookahead: Option<f64>,
    pub default_lookahead: Option<f64>,
    pub safety_margin: Option<f64>,
    pub quality_thresholds_ms: Option<[f64; 4]>,
    pub buffer_wait_ms: Option<u64>,
    pub ready_timeout_ms: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Wall-clock alignment thresholds
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Wait for the deadline when more than this many ms remain
    pub wait_threshold_ms: i64,
    /// Seek forward when the deadline passed by more than this (negative)
    pub late_threshold_ms: i64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            wait_threshold_ms: 50,
            late_threshold_ms: -100,
        }
    }
}

/// Cross-fade timing
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct TransitionSettings {
    /// Fade duration when switching to different content
    pub new_media_ms: u64,
    /// Fade duration for a position change within the same content
    pub same_media_ms: u64,
    /// Rendering frame interval used by frame yields
    pub frame_interval_ms: u64,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            new_media_ms: 6000,
            same_media_ms: 4000,
            frame_interval_ms: 16,
        }
    }
}

impl TransitionSettings {
    pub fn duration_for(&self, same_media: bool) -> Duration {
        if same_media {
            Duration::from_millis(self.same_media_ms)
        } else {
            Duration::from_millis(self.new_media_ms)
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-back-end overrides keyed by back-end name
    #[serde(default)]
    pub backends: HashMap<BackendId, BackendOverrides>,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub transition: TransitionSettings,

    /// Slack added to loop-restart timers (seconds)
    #[serde(default = "default_loop_margin")]
    pub loop_margin_seconds: f64,

    /// Load-time samples kept per back-end
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Log the statistics report every N switches (0 disables)
    #[serde(default = "default_stats_report_interval")]
    pub stats_report_interval: u64,
}

fn default_port() -> u16 {
    5760
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_loop_margin() -> f64 {
    0.5
}

fn default_history_capacity() -> usize {
    15
}

fn default_stats_report_interval() -> u64 {
    5
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            logging: LoggingConfig::default(),
            backends: HashMap::new(),
            sync: SyncSettings::default(),
            transition: TransitionSettings::default(),
            loop_margin_seconds: default_loop_margin(),
            history_capacity: default_history_capacity(),
            stats_report_interval: default_stats_report_interval(),
        }
    }
}

impl TomlConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let config: TomlConfig = evs_common::config::load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Effective look-ahead policy for a back-end
    pub fn backend_config(&self, backend: BackendId) -> BackendConfig {
        let mut config = BackendConfig::for_backend(backend);
        if let Some(o) = self.backends.get(&backend) {
            config.min_lookahead = o.min_lookahead.unwrap_or(config.min_lookahead);
            config.max_lookahead = o.max_lookahead.unwrap_or(config.max_lookahead);
            config.default_lookahead = o.default_lookahead.unwrap_or(config.default_lookahead);
            config.safety_margin = o.safety_margin.unwrap_or(config.safety_margin);
            config.quality_thresholds_ms =
                o.quality_thresholds_ms.unwrap_or(config.quality_thresholds_ms);
        }
        config
    }

    /// Effective surface timing for a back-end
    pub fn surface_settings(&self, backend: BackendId) -> SurfaceSettings {
        let mut settings = SurfaceSettings::for_backend(backend);
        if let Some(o) = self.backends.get(&backend) {
            if let Some(ms) = o.buffer_wait_ms {
                settings.buffer_wait = Duration::from_millis(ms);
            }
            if let Some(ms) = o.ready_timeout_ms {
                settings.ready_timeout = Duration::from_millis(ms);
            }
        }
        settings
    }

    /// Reject configurations the estimator and orchestrator cannot honour
    pub fn validate(&self) -> Result<()> {
        for backend in BackendId::ALL {
            self.backend_config(backend).validate(backend)?;
        }
        if self.history_capacity == 0 {
            return Err(Error::Config("history_capacity must be at least 1".to_string()));
        }
        if self.sync.late_threshold_ms > self.sync.wait_threshold_ms {
            return Err(Error::Config(
                "sync.late_threshold_ms must not exceed sync.wait_threshold_ms".to_string(),
            ));
        }
        if !self.loop_margin_seconds.is_finite() || self.loop_margin_seconds < 0.0 {
            return Err(Error::Config("loop_margin_seconds must be >= 0".to_string()));
        }
        Ok(())
    }
}
