//! Playback surface
//!
//! One of the two stacked video slots. A surface owns at most one back-end
//! driver at a time and recreates it when the requested back-end changes.
//! Loading resolves once the surface is buffered at the start position:
//! on the readiness signal for back-ends that send one, after a fixed wait
//! for those that don't, or after the readiness timeout. A load never hangs.
//!
//! Failures are logged and swallowed here; the orchestrator only sees the
//! [`LoadOutcome`].

pub mod driver;
pub mod transition;

pub use driver::{BackendDriver, DriverError, DriverFactory, DriverSignal, SignalSender};
pub use transition::{Opacity, StackOrder, SurfaceSlot, TransitionDriver};

use crate::backend::{BackendId, Capabilities, PerBackend};
use crate::config::SurfaceSettings;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How a load attempt came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The back-end reported it was buffered and playing
    Signaled,
    /// Fixed buffering wait elapsed (no readiness signal available)
    FixedWait,
    /// No readiness signal within the timeout
    TimedOut,
    /// The driver could not be created or refused the load
    Failed,
}

/// Result of [`PlaybackSurface::load`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOutcome {
    pub elapsed: Duration,
    pub readiness: Readiness,
}

impl LoadOutcome {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Whether the elapsed time is a meaningful load-time sample
    pub fn is_measured(&self) -> bool {
        self.readiness != Readiness::Failed
    }
}

/// Media currently held by a surface
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    pub media_id: String,
    pub page: u32,
}

type PendingReady = Arc<Mutex<Option<oneshot::Sender<()>>>>;

/// Driver plus the task listening to its signals
struct SurfaceResource {
    backend: BackendId,
    driver: Arc<dyn BackendDriver>,
    pending_ready: PendingReady,
    listener: JoinHandle<()>,
}

impl Drop for SurfaceResource {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

pub struct PlaybackSurface {
    slot: SurfaceSlot,
    factory: Arc<dyn DriverFactory>,
    visuals: Arc<dyn TransitionDriver>,
    settings: PerBackend<SurfaceSettings>,
    resource: Option<SurfaceResource>,
    ready: bool,
    current_media: Option<MediaRef>,
}

impl PlaybackSurface {
    pub fn new(
        slot: SurfaceSlot,
        factory: Arc<dyn DriverFactory>,
        visuals: Arc<dyn TransitionDriver>,
        settings: PerBackend<SurfaceSettings>,
    ) -> Self {
        Self {
            slot,
            factory,
            visuals,
            settings,
            resource: None,
            ready: false,
            current_media: None,
        }
    }

    pub fn slot(&self) -> SurfaceSlot {
        self.slot
    }

    /// Back-end of the live driver, if any
    pub fn backend(&self) -> Option<BackendId> {
        self.resource.as_ref().map(|r| r.backend)
    }

    pub fn capabilities(&self) -> Option<Capabilities> {
        self.backend().map(|b| b.capabilities())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn current_media(&self) -> Option<&MediaRef> {
        self.current_media.as_ref()
    }

    /// Load media and buffer it at `start_seconds`
    pub async fn load(
        &mut self,
        backend: BackendId,
        media_id: &str,
        start_seconds: f64,
        page: u32,
    ) -> LoadOutcome {
        let started = Instant::now();
        self.ready = false;

        if self.backend() != Some(backend) {
            if let Some(previous) = self.backend() {
                info!(
                    "[Surface {}] Back-end change {} -> {}, recreating driver",
                    self.slot, previous, backend
                );
            }
            self.release();
            match self.create_resource(backend) {
                Ok(resource) => self.resource = Some(resource),
                Err(e) => {
                    warn!("[Surface {}] Failed to create {} driver: {}", self.slot, backend, e);
                    return LoadOutcome {
                        elapsed: started.elapsed(),
                        readiness: Readiness::Failed,
                    };
                }
            }
        }

        let Some(resource) = self.resource.as_ref() else {
            return LoadOutcome {
                elapsed: started.elapsed(),
                readiness: Readiness::Failed,
            };
        };
        let driver = Arc::clone(&resource.driver);
        let pending = Arc::clone(&resource.pending_ready);
        let caps = backend.capabilities();
        let settings = *self.settings.get(backend);

        let ready_rx = if caps.readiness_signaled {
            let (tx, rx) = oneshot::channel();
            set_pending(&pending, Some(tx));
            Some(rx)
        } else {
            None
        };

        self.current_media = Some(MediaRef {
            media_id: media_id.to_string(),
            page,
        });

        debug!(
            "[Surface {}] Loading {}:{} at {:.2}s (page {})",
            self.slot, backend, media_id, start_seconds, page
        );
        if let Err(e) = driver.load(media_id, start_seconds, page) {
            warn!("[Surface {}] Load of {} rejected: {}", self.slot, media_id, e);
            set_pending(&pending, None);
            return LoadOutcome {
                elapsed: started.elapsed(),
                readiness: Readiness::Failed,
            };
        }
        self.mute(caps);

        let readiness = match ready_rx {
            Some(rx) => match tokio::time::timeout(settings.ready_timeout, rx).await {
                Ok(Ok(())) => {
                    // Hold the buffered frame until the orchestrator starts playback
                    if let Err(e) = driver.pause() {
                        warn!("[Surface {}] Pause after ready failed: {}", self.slot, e);
                    }
                    Readiness::Signaled
                }
                Ok(Err(_)) => {
                    warn!("[Surface {}] Signal listener went away during load", self.slot);
                    Readiness::Failed
                }
                Err(_) => {
                    warn!(
                        "[Surface {}] No readiness signal within {:?}, proceeding",
                        self.slot, settings.ready_timeout
                    );
                    set_pending(&pending, None);
                    Readiness::TimedOut
                }
            },
            None => {
                tokio::time::sleep(settings.buffer_wait).await;
                Readiness::FixedWait
            }
        };

        self.ready = matches!(readiness, Readiness::Signaled | Readiness::FixedWait);
        let outcome = LoadOutcome {
            elapsed: started.elapsed(),
            readiness,
        };
        debug!(
            "[Surface {}] Load finished: {:?} after {:.0}ms",
            self.slot,
            readiness,
            outcome.elapsed_ms()
        );
        outcome
    }

    /// Start playback (muted)
    pub fn play(&self) {
        let Some(resource) = self.resource.as_ref() else {
            debug!("[Surface {}] play() without a driver", self.slot);
            return;
        };
        self.mute(resource.backend.capabilities());
        if let Err(e) = resource.driver.play() {
            warn!("[Surface {}] Play failed: {}", self.slot, e);
        }
    }

    /// Pause and destroy the driver; safe to call repeatedly
    pub fn stop(&mut self) {
        if let Some(resource) = self.resource.as_ref() {
            debug!("[Surface {}] Stopping {}", self.slot, resource.backend);
        }
        self.release();
        self.ready = false;
        self.current_media = None;
    }

    /// Seek to an absolute position where the back-end supports it
    pub fn seek_to(&self, seconds: f64) {
        let Some(resource) = self.resource.as_ref() else {
            return;
        };
        if !resource.backend.capabilities().seekable {
            debug!("[Surface {}] {} cannot seek, ignored", self.slot, resource.backend);
            return;
        }
        if let Err(e) = resource.driver.seek(seconds) {
            warn!("[Surface {}] Seek to {:.2}s failed: {}", self.slot, seconds, e);
        }
    }

    /// Replay the current media from the start
    ///
    /// Back-ends that loop by themselves are left alone. Returns whether a
    /// restart was issued.
    pub fn restart_from_beginning(&self) -> bool {
        let (Some(resource), Some(media)) = (self.resource.as_ref(), self.current_media.as_ref())
        else {
            return false;
        };
        let caps = resource.backend.capabilities();
        if caps.native_loop {
            return false;
        }

        if let Err(e) = resource.driver.load(&media.media_id, 0.0, media.page) {
            warn!("[Surface {}] Restart of {} failed: {}", self.slot, media.media_id, e);
            return false;
        }
        self.mute(caps);
        true
    }

    pub fn show(&self) {
        self.visuals.set_opacity(self.slot, Opacity::Visible);
        self.visuals.set_stack_order(self.slot, StackOrder::Front);
    }

    pub fn hide(&self) {
        self.visuals.set_opacity(self.slot, Opacity::Hidden);
        self.visuals.set_stack_order(self.slot, StackOrder::Back);
    }

    pub fn set_opacity(&self, opacity: Opacity) {
        self.visuals.set_opacity(self.slot, opacity);
    }

    pub fn set_stack_order(&self, order: StackOrder) {
        self.visuals.set_stack_order(self.slot, order);
    }

    pub fn set_transition(&self, duration: Duration) {
        self.visuals.apply_transition(self.slot, Some(duration));
    }

    pub fn disable_transition(&self) {
        self.visuals.apply_transition(self.slot, None);
    }

    pub fn flush_layout(&self) {
        self.visuals.flush_layout(self.slot);
    }

    fn mute(&self, caps: Capabilities) {
        let Some(resource) = self.resource.as_ref() else {
            return;
        };
        match resource.driver.mute() {
            Ok(()) => {}
            Err(e) if caps.mute_required => {
                warn!("[Surface {}] Mute failed: {}", self.slot, e)
            }
            Err(e) => debug!("[Surface {}] Best-effort mute failed: {}", self.slot, e),
        }
    }

    fn create_resource(&self, backend: BackendId) -> Result<SurfaceResource, DriverError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let driver = self.factory.create(backend, self.slot, tx)?;
        let pending_ready: PendingReady = Arc::new(Mutex::new(None));

        let listener = tokio::spawn(listen_for_signals(
            self.slot,
            backend,
            Arc::clone(&driver),
            Arc::clone(&pending_ready),
            rx,
        ));

        Ok(SurfaceResource {
            backend,
            driver,
            pending_ready,
            listener,
        })
    }

    fn release(&mut self) {
        if let Some(resource) = self.resource.take() {
            if let Err(e) = resource.driver.pause() {
                debug!("[Surface {}] Pause before destroy failed: {}", self.slot, e);
            }
            if let Err(e) = resource.driver.destroy() {
                warn!("[Surface {}] Destroy failed: {}", self.slot, e);
            }
        }
    }
}

impl Drop for PlaybackSurface {
    fn drop(&mut self) {
        self.release();
    }
}

fn set_pending(pending: &PendingReady, value: Option<oneshot::Sender<()>>) {
    let mut guard = pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = value;
}

async fn listen_for_signals(
    slot: SurfaceSlot,
    backend: BackendId,
    driver: Arc<dyn BackendDriver>,
    pending: PendingReady,
    mut signals: mpsc::UnboundedReceiver<DriverSignal>,
) {
    let caps = backend.capabilities();
    while let Some(signal) = signals.recv().await {
        match signal {
            DriverSignal::Ready => {
                let waiter = pending
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .take();
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(());
                    }
                    None => debug!("[Surface {}] Ready signal with no pending load", slot),
                }
            }
            DriverSignal::Ended if caps.native_loop => {
                debug!("[Surface {}] End of media, replaying", slot);
                if let Err(e) = driver.play() {
                    warn!("[Surface {}] Replay failed: {}", slot, e);
                }
            }
            DriverSignal::Ended => {
                // Loop-incapable back-ends are restarted by the loop timer
                debug!("[Surface {}] End of media on {} ignored", slot, backend);
            }
        }
    }
}
