//! Test helper modules for evs-player integration tests
//!
//! - RecordingDriverFactory: scripted back-end drivers that log every call
//! - RecordingTransitions: renderer stand-in that logs style changes
//! - PausedClock: wall clock that follows tokio's (pausable) time

#![allow(dead_code)]

pub mod clock;
pub mod recording;

pub use clock::PausedClock;
pub use recording::{DriverCall, RecordingDriverFactory, RecordingTransitions, VisualCall};

use evs_player::config::TomlConfig;
use evs_player::estimator::LoadTimeEstimator;
use evs_player::orchestrator::SwitchOrchestrator;
use std::sync::Arc;

/// Orchestrator wired to recording fakes
pub struct Harness {
    pub orchestrator: Arc<SwitchOrchestrator>,
    pub drivers: Arc<RecordingDriverFactory>,
    pub visuals: Arc<RecordingTransitions>,
    pub clock: Arc<PausedClock>,
}

impl Harness {
    pub async fn new(config: TomlConfig, drivers: RecordingDriverFactory) -> Self {
        let drivers = Arc::new(drivers);
        let visuals = Arc::new(RecordingTransitions::new());
        let clock = Arc::new(PausedClock::new());
        let estimator = Arc::new(tokio::sync::Mutex::new(LoadTimeEstimator::from_config(&config)));

        let orchestrator = SwitchOrchestrator::new(
            &config,
            Arc::clone(&drivers) as _,
            Arc::clone(&visuals) as _,
            estimator,
            Arc::clone(&clock) as _,
        );
        orchestrator.initialize().await;

        Self {
            orchestrator,
            drivers,
            visuals,
            clock,
        }
    }
}
