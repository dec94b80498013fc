//! Switch orchestration
//!
//! Owns the two playback surfaces and performs the synchronized cross-fade
//! from the active surface to the standby one:
//!
//! 1. Reject the request if a switch is already in flight
//! 2. Ask the estimator for a look-ahead and load the standby surface at
//!    `target + lookahead`, recording the load time
//! 3. Align to the wall-clock deadline `wall_clock_target + lookahead`:
//!    wait when early, seek forward when late (seekable back-ends only)
//! 4. Start playback on the still-hidden standby, then fade it in over the
//!    active one after two frame yields
//! 5. Stop and hide the old surface, swap roles
//! 6. Arm the loop timer for back-ends that can't loop by themselves
//!
//! Any failure abandons the switch with the old surface still on screen.

pub mod alignment;
pub mod loop_timer;
pub mod state;

pub use alignment::{plan_alignment, Alignment};
pub use loop_timer::{loop_delay, LoopTimer};
pub use state::{OrchestratorSnapshot, OrchestratorState, SwitchPhase, TransitionGuard};

use crate::backend::{BackendId, PerBackend};
use crate::config::{SyncSettings, TomlConfig, TransitionSettings};
use crate::error::{Error, Result};
use crate::estimator::LoadTimeEstimator;
use crate::request::{RequestSource, SwitchRequest};
use crate::surface::{
    DriverError, DriverFactory, Opacity, PlaybackSurface, Readiness, StackOrder, SurfaceSlot,
    TransitionDriver,
};
use chrono::Utc;
use evs_common::events::EvsEvent;
use evs_common::time::WallClock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Orchestrator tunables taken from the configuration
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    pub sync: SyncSettings,
    pub transition: TransitionSettings,
    pub loop_margin_seconds: f64,
    pub stats_report_interval: u64,
}

impl From<&TomlConfig> for OrchestratorSettings {
    fn from(config: &TomlConfig) -> Self {
        Self {
            sync: config.sync,
            transition: config.transition,
            loop_margin_seconds: config.loop_margin_seconds,
            stats_report_interval: config.stats_report_interval,
        }
    }
}

/// How a call to [`SwitchOrchestrator::switch_to`] ended
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchOutcome {
    Completed {
        sequence: u64,
        lookahead_seconds: f64,
    },
    /// Another switch was in flight; nothing changed
    Rejected,
    Failed {
        sequence: u64,
        reason: String,
    },
}

/// What a successful switch hands to the post-switch steps
struct SwitchSummary {
    lookahead_seconds: f64,
}

pub struct SwitchOrchestrator {
    surfaces: [tokio::sync::Mutex<PlaybackSurface>; 2],
    estimator: Arc<tokio::sync::Mutex<LoadTimeEstimator>>,
    visuals: Arc<dyn TransitionDriver>,
    clock: Arc<dyn WallClock>,
    settings: OrchestratorSettings,
    transitioning: AtomicBool,
    state: Mutex<OrchestratorState>,
    loop_timer: Mutex<LoopTimer>,
    events: broadcast::Sender<EvsEvent>,
}

impl SwitchOrchestrator {
    pub fn new(
        config: &TomlConfig,
        factory: Arc<dyn DriverFactory>,
        visuals: Arc<dyn TransitionDriver>,
        estimator: Arc<tokio::sync::Mutex<LoadTimeEstimator>>,
        clock: Arc<dyn WallClock>,
    ) -> Arc<Self> {
        let surface = |index: usize| {
            tokio::sync::Mutex::new(PlaybackSurface::new(
                SurfaceSlot(index),
                Arc::clone(&factory),
                Arc::clone(&visuals),
                PerBackend::from_fn(|b| config.surface_settings(b)),
            ))
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Arc::new(Self {
            surfaces: [surface(0), surface(1)],
            estimator,
            visuals: Arc::clone(&visuals),
            clock,
            settings: OrchestratorSettings::from(config),
            transitioning: AtomicBool::new(false),
            state: Mutex::new(OrchestratorState::default()),
            loop_timer: Mutex::new(LoopTimer::default()),
            events,
        })
    }

    /// Put surface 0 on screen and surface 1 behind it
    pub async fn initialize(&self) {
        let active = self.state().active_index;
        self.surfaces[active].lock().await.show();
        self.surfaces[1 - active].lock().await.hide();
        info!("Orchestrator initialized, surface {} active", active);
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<EvsEvent> {
        self.events.subscribe()
    }

    pub fn estimator(&self) -> Arc<tokio::sync::Mutex<LoadTimeEstimator>> {
        Arc::clone(&self.estimator)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> OrchestratorSnapshot {
        let state = self.state().clone();
        OrchestratorSnapshot {
            active_surface: state.active_index,
            phase: state.phase,
            transitioning: self.is_transitioning(),
            switch_sequence: state.switch_sequence,
            last_media_id: state.last_media_id,
            last_backend: state.last_backend,
            loop_timer_armed: self.loop_timer().is_armed(),
        }
    }

    /// Perform one synchronized switch
    ///
    /// Resolves once the switch completed, failed or was rejected; it never
    /// waits on a signal that may not come.
    pub async fn switch_to(self: &Arc<Self>, request: SwitchRequest) -> SwitchOutcome {
        let Some(guard) = TransitionGuard::acquire(&self.transitioning) else {
            info!(
                "Switch in progress, dropping request for {}:{}",
                request.backend, request.media_id
            );
            self.emit(EvsEvent::SwitchRejected {
                backend: request.backend.to_string(),
                media_id: request.media_id.clone(),
                timestamp: Utc::now(),
            });
            return SwitchOutcome::Rejected;
        };

        let started = Instant::now();
        let sequence = {
            let mut state = self.state();
            state.switch_sequence += 1;
            state.phase = SwitchPhase::Loading;
            state.switch_sequence
        };

        let result = self.run_switch(sequence, &request, started).await;
        self.state().phase = SwitchPhase::Idle;
        drop(guard);

        match result {
            Ok(summary) => {
                let elapsed = started.elapsed();
                self.arm_loop_timer(&request, summary.lookahead_seconds, elapsed);
                info!(
                    "[Switch #{}] Complete in {:.0}ms",
                    sequence,
                    elapsed.as_secs_f64() * 1000.0
                );
                self.emit(EvsEvent::SwitchCompleted {
                    sequence,
                    backend: request.backend.to_string(),
                    media_id: request.media_id.clone(),
                    active_surface: self.state().active_index,
                    total_ms: elapsed.as_millis() as u64,
                    timestamp: Utc::now(),
                });
                self.maybe_report_stats(sequence, request.backend).await;
                SwitchOutcome::Completed {
                    sequence,
                    lookahead_seconds: summary.lookahead_seconds,
                }
            }
            Err(e) => {
                error!("[Switch #{}] Abandoned: {}", sequence, e);
                self.emit(EvsEvent::SwitchFailed {
                    sequence,
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                SwitchOutcome::Failed {
                    sequence,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Dispatch requests until the source closes, one task per request
    ///
    /// Requests arriving mid-switch reach [`switch_to`](Self::switch_to) and
    /// are rejected there.
    pub async fn run_request_loop(self: Arc<Self>, mut source: RequestSource) {
        info!("Request loop started");
        while let Some(request) = source.next().await {
            debug!(
                "Request received: {}:{} @ {:.2}s",
                request.backend, request.media_id, request.target_position_seconds
            );
            let orchestrator = Arc::clone(&self);
            tokio::spawn(async move {
                orchestrator.switch_to(request).await;
            });
        }
        info!("Request source closed, request loop stopped");
    }

    /// Cancel the loop timer and stop both surfaces
    pub async fn shutdown(&self) {
        self.loop_timer().cancel();
        for surface in &self.surfaces {
            surface.lock().await.stop();
        }
        info!("Orchestrator shut down");
    }

    async fn run_switch(
        &self,
        sequence: u64,
        request: &SwitchRequest,
        started: Instant,
    ) -> Result<SwitchSummary> {
        let backend = request.backend;
        let caps = backend.capabilities();
        let (active_index, standby_index, same_media) = {
            let state = self.state();
            (
                state.active_index,
                state.standby_index(),
                state.is_same_media(backend, &request.media_id),
            )
        };
        let transition = self.settings.transition.duration_for(same_media);

        let lookahead = self.estimator.lock().await.recommended_lookahead(backend);
        let start_position = request.target_position_seconds + lookahead;

        info!(
            "[Switch #{}] {}:{} target {:.2}s, look-ahead {:.2}s{}",
            sequence,
            backend,
            request.media_id,
            request.target_position_seconds,
            lookahead,
            if same_media { " (same media)" } else { "" }
        );
        self.emit(EvsEvent::SwitchStarted {
            sequence,
            backend: backend.to_string(),
            media_id: request.media_id.clone(),
            lookahead_seconds: lookahead,
            same_media,
            timestamp: Utc::now(),
        });

        let mut standby = self.surfaces[standby_index].lock().await;
        let outcome = standby
            .load(backend, &request.media_id, start_position, request.page)
            .await;

        if outcome.is_measured() {
            self.estimator
                .lock()
                .await
                .record_load_time(backend, outcome.elapsed_ms());
        }
        if outcome.readiness == Readiness::Failed {
            standby.stop();
            return Err(Error::Driver(DriverError::Failed(format!(
                "could not load {}:{}",
                backend, request.media_id
            ))));
        }
        debug!(
            "[Switch #{}] Standby surface {} loaded in {:.0}ms ({:?})",
            sequence,
            standby_index,
            outcome.elapsed_ms(),
            outcome.readiness
        );

        if request.sync_enabled {
            self.state().phase = SwitchPhase::Aligning;
            let deadline = request.wall_clock_target_millis as f64 + lookahead * 1000.0;
            let remaining_ms = deadline - self.clock.now_millis() as f64;

            match plan_alignment(remaining_ms, caps.seekable, &self.settings.sync) {
                Alignment::Wait(delay) => {
                    debug!("[Switch #{}] Early by {:.0}ms, waiting", sequence, remaining_ms);
                    tokio::time::sleep(delay).await;
                }
                Alignment::Correct { late_ms } => {
                    let seek_to = start_position + late_ms / 1000.0;
                    warn!(
                        "[Switch #{}] Late by {:.0}ms, seeking to {:.2}s",
                        sequence, late_ms, seek_to
                    );
                    standby.seek_to(seek_to);
                    self.estimator.lock().await.record_late(backend, late_ms);
                    self.emit(EvsEvent::LateCorrection {
                        sequence,
                        backend: backend.to_string(),
                        late_ms: late_ms.round() as u64,
                        seek_to_seconds: seek_to,
                        timestamp: Utc::now(),
                    });
                }
                Alignment::Uncorrectable { late_ms } => {
                    debug!(
                        "[Switch #{}] Late by {:.0}ms, {} cannot seek",
                        sequence, late_ms, backend
                    );
                }
                Alignment::OnTime => {}
            }
        }

        self.state().phase = SwitchPhase::Transitioning;
        let mut active = self.surfaces[active_index].lock().await;

        // Standby goes on top but invisible, with no transition so the
        // opacity change is instant
        active.set_stack_order(StackOrder::Back);
        standby.disable_transition();
        standby.set_opacity(Opacity::Hidden);
        standby.set_stack_order(StackOrder::Front);
        standby.flush_layout();

        // Playing before the reveal avoids fading in a frozen first frame
        standby.play();

        self.visuals.next_frame().await;
        standby.set_transition(transition);
        self.visuals.next_frame().await;
        standby.set_opacity(Opacity::Visible);

        tokio::time::sleep(transition).await;

        active.stop();
        active.disable_transition();
        active.hide();

        {
            let mut state = self.state();
            state.active_index = standby_index;
            state.last_backend = Some(backend);
            state.last_media_id = Some(request.media_id.clone());
        }
        debug!(
            "[Switch #{}] Surface {} active after {:.0}ms",
            sequence,
            standby_index,
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(SwitchSummary {
            lookahead_seconds: lookahead,
        })
    }

    /// Replace any pending loop timer with one for the new active media
    fn arm_loop_timer(self: &Arc<Self>, request: &SwitchRequest, lookahead: f64, elapsed: Duration) {
        let mut timer = self.loop_timer();
        let generation = timer.begin();

        if request.backend.capabilities().native_loop {
            return;
        }
        let Some(duration) = request.duration_seconds else {
            debug!("No duration for {}, loop emulation off", request.media_id);
            return;
        };
        let margin = self.settings.loop_margin_seconds;
        let start_position = request.target_position_seconds + lookahead;
        let Some(first_delay) =
            loop_delay(duration, start_position, elapsed.as_secs_f64(), margin)
        else {
            info!(
                "{} already past its end ({:.1}s of {:.1}s), loop timer skipped",
                request.media_id,
                start_position + elapsed.as_secs_f64(),
                duration
            );
            return;
        };

        debug!(
            "Loop timer armed for {}:{} in {:.1}s",
            request.backend,
            request.media_id,
            first_delay.as_secs_f64()
        );

        let orchestrator = Arc::downgrade(self);
        let backend = request.backend;
        let media_id = request.media_id.clone();
        let handle = tokio::spawn(async move {
            let mut delay = first_delay;
            loop {
                tokio::time::sleep(delay).await;
                let Some(this) = orchestrator.upgrade() else {
                    break;
                };
                if !this.restart_for_loop(generation, backend, &media_id).await {
                    break;
                }
                match loop_delay(duration, 0.0, 0.0, margin) {
                    Some(next) => delay = next,
                    None => break,
                }
            }
        });
        timer.attach(generation, handle);
    }

    async fn restart_for_loop(&self, generation: u64, backend: BackendId, media_id: &str) -> bool {
        if !self.loop_timer().is_current(generation) {
            return false;
        }
        let active_index = self.state().active_index;
        let surface = self.surfaces[active_index].lock().await;

        let still_showing = surface.backend() == Some(backend)
            && surface.current_media().map(|m| m.media_id.as_str()) == Some(media_id);
        if !still_showing || !self.loop_timer().is_current(generation) {
            debug!("Loop timer for {} is stale, dropped", media_id);
            return false;
        }
        if !surface.restart_from_beginning() {
            return false;
        }

        info!("[Loop] Restarted {}:{} from the beginning", backend, media_id);
        self.emit(EvsEvent::LoopRestarted {
            backend: backend.to_string(),
            media_id: media_id.to_string(),
            timestamp: Utc::now(),
        });
        true
    }

    async fn maybe_report_stats(&self, sequence: u64, backend: BackendId) {
        let interval = self.settings.stats_report_interval;
        if interval == 0 || sequence % interval != 0 {
            return;
        }
        let report = self.estimator.lock().await.report(backend);
        info!("\n{}", report);
    }

    fn emit(&self, event: EvsEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn state(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn loop_timer(&self) -> MutexGuard<'_, LoopTimer> {
        self.loop_timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
