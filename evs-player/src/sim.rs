//! Simulated back-ends and renderer
//!
//! The player binary has no embedded video platforms; these stand-ins log
//! what a real embed would do and model load latency so the estimator has
//! something to learn from.

use crate::backend::{BackendId, PerBackend};
use crate::surface::{
    BackendDriver, DriverError, DriverFactory, DriverSignal, Opacity, SignalSender, StackOrder,
    SurfaceSlot, TransitionDriver,
};
use async_trait::async_trait;
use rand::Rng;
use std::ops::Range;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Driver factory with uniformly jittered load latency per back-end
#[derive(Debug, Clone)]
pub struct SimulatedDriverFactory {
    latency_ms: PerBackend<Range<u64>>,
}

impl SimulatedDriverFactory {
    pub fn new(latency_ms: PerBackend<Range<u64>>) -> Self {
        Self { latency_ms }
    }
}

impl Default for SimulatedDriverFactory {
    fn default() -> Self {
        Self::new(PerBackend {
            youtube: 300..1500,
            bilibili: 1500..4000,
        })
    }
}

impl DriverFactory for SimulatedDriverFactory {
    fn create(
        &self,
        backend: BackendId,
        slot: SurfaceSlot,
        signals: SignalSender,
    ) -> Result<Arc<dyn BackendDriver>, DriverError> {
        debug!("[Sim {}] Creating {} embed", slot, backend);
        Ok(Arc::new(SimulatedDriver {
            backend,
            slot,
            latency_ms: self.latency_ms.get(backend).clone(),
            signals,
            pending: Mutex::new(None),
        }))
    }
}

pub struct SimulatedDriver {
    backend: BackendId,
    slot: SurfaceSlot,
    latency_ms: Range<u64>,
    signals: SignalSender,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedDriver {
    fn replace_pending(&self, task: Option<JoinHandle<()>>) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = task;
    }
}

impl BackendDriver for SimulatedDriver {
    fn load(&self, media_id: &str, start_seconds: f64, page: u32) -> Result<(), DriverError> {
        let latency = if self.latency_ms.is_empty() {
            Duration::from_millis(self.latency_ms.start)
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(self.latency_ms.clone()))
        };
        debug!(
            "[Sim {}] {} load {} p{} at {:.2}s (latency {:?})",
            self.slot, self.backend, media_id, page, start_seconds, latency
        );

        if self.backend.capabilities().readiness_signaled {
            let signals = self.signals.clone();
            let task = tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                let _ = signals.send(DriverSignal::Ready);
            });
            self.replace_pending(Some(task));
        }
        Ok(())
    }

    fn play(&self) -> Result<(), DriverError> {
        debug!("[Sim {}] {} play", self.slot, self.backend);
        Ok(())
    }

    fn pause(&self) -> Result<(), DriverError> {
        trace!("[Sim {}] {} pause", self.slot, self.backend);
        Ok(())
    }

    fn mute(&self) -> Result<(), DriverError> {
        trace!("[Sim {}] {} mute", self.slot, self.backend);
        Ok(())
    }

    fn seek(&self, seconds: f64) -> Result<(), DriverError> {
        if !self.backend.capabilities().seekable {
            return Err(DriverError::Unsupported("seek"));
        }
        debug!("[Sim {}] {} seek to {:.2}s", self.slot, self.backend, seconds);
        Ok(())
    }

    fn destroy(&self) -> Result<(), DriverError> {
        debug!("[Sim {}] {} destroyed", self.slot, self.backend);
        self.replace_pending(None);
        Ok(())
    }
}

/// Renderer stand-in: logs style changes and paces frames
#[derive(Debug)]
pub struct LoggingTransitionDriver {
    frame_interval: Duration,
}

impl LoggingTransitionDriver {
    pub fn new(frame_interval: Duration) -> Self {
        Self { frame_interval }
    }
}

#[async_trait]
impl TransitionDriver for LoggingTransitionDriver {
    fn apply_transition(&self, slot: SurfaceSlot, duration: Option<Duration>) {
        match duration {
            Some(d) => trace!("[Render {}] opacity transition {}ms", slot, d.as_millis()),
            None => trace!("[Render {}] opacity transition off", slot),
        }
    }

    fn set_opacity(&self, slot: SurfaceSlot, opacity: Opacity) {
        debug!("[Render {}] opacity {:?}", slot, opacity);
    }

    fn set_stack_order(&self, slot: SurfaceSlot, order: StackOrder) {
        trace!("[Render {}] stack {:?}", slot, order);
    }

    fn flush_layout(&self, slot: SurfaceSlot) {
        trace!("[Render {}] layout flush", slot);
    }

    async fn next_frame(&self) {
        tokio::time::sleep(self.frame_interval).await;
    }
}
