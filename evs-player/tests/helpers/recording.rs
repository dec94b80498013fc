//! Recording fakes for drivers and the renderer

use async_trait::async_trait;
use evs_player::backend::BackendId;
use evs_player::surface::{
    BackendDriver, DriverError, DriverFactory, DriverSignal, Opacity, SignalSender, StackOrder,
    SurfaceSlot, TransitionDriver,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Create(BackendId),
    Load { media_id: String, start_seconds: f64 },
    Play,
    Pause,
    Mute,
    Seek(f64),
    Destroy,
}

/// One recorded driver call with when and where it happened
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub slot: SurfaceSlot,
    pub call: DriverCall,
}

#[derive(Default)]
struct FactoryShared {
    calls: Mutex<Vec<RecordedCall>>,
    signals: Mutex<HashMap<usize, SignalSender>>,
}

impl FactoryShared {
    fn record(&self, slot: SurfaceSlot, call: DriverCall) {
        self.calls.lock().unwrap().push(RecordedCall {
            at: Instant::now(),
            slot,
            call,
        });
    }
}

/// Driver factory whose drivers log every call
///
/// Drivers of readiness-signaling back-ends send `Ready` after
/// `ready_delay`; `None` means they never do.
pub struct RecordingDriverFactory {
    shared: Arc<FactoryShared>,
    ready_delay: Option<Duration>,
    fail_create: AtomicBool,
    fail_load: AtomicBool,
}

impl RecordingDriverFactory {
    pub fn new(ready_delay: Option<Duration>) -> Self {
        Self {
            shared: Arc::new(FactoryShared::default()),
            ready_delay,
            fail_create: AtomicBool::new(false),
            fail_load: AtomicBool::new(false),
        }
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn calls_on(&self, slot: usize) -> Vec<DriverCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.slot.index() == slot)
            .map(|c| c.call)
            .collect()
    }

    /// Loads that started a media from position 0
    pub fn restarts_of(&self, media_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                matches!(&c.call, DriverCall::Load { media_id: m, start_seconds } if m == media_id && *start_seconds == 0.0)
            })
            .count()
    }

    pub fn first_at(&self, predicate: impl Fn(&RecordedCall) -> bool) -> Option<Instant> {
        self.calls().into_iter().find(|c| predicate(c)).map(|c| c.at)
    }

    /// Deliver a signal as the driver on `slot` would
    pub fn send_signal(&self, slot: usize, signal: DriverSignal) {
        if let Some(tx) = self.shared.signals.lock().unwrap().get(&slot) {
            let _ = tx.send(signal);
        }
    }
}

impl DriverFactory for RecordingDriverFactory {
    fn create(
        &self,
        backend: BackendId,
        slot: SurfaceSlot,
        signals: SignalSender,
    ) -> Result<Arc<dyn BackendDriver>, DriverError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(DriverError::Failed("embed refused to initialize".to_string()));
        }
        self.shared.record(slot, DriverCall::Create(backend));
        self.shared
            .signals
            .lock()
            .unwrap()
            .insert(slot.index(), signals.clone());

        let ready_delay = if backend.capabilities().readiness_signaled {
            self.ready_delay
        } else {
            None
        };
        Ok(Arc::new(RecordingDriver {
            shared: Arc::clone(&self.shared),
            slot,
            signals,
            ready_delay,
            fail_load: self.fail_load.load(Ordering::SeqCst),
        }))
    }
}

struct RecordingDriver {
    shared: Arc<FactoryShared>,
    slot: SurfaceSlot,
    signals: SignalSender,
    ready_delay: Option<Duration>,
    fail_load: bool,
}

impl BackendDriver for RecordingDriver {
    fn load(&self, media_id: &str, start_seconds: f64, _page: u32) -> Result<(), DriverError> {
        if self.fail_load {
            return Err(DriverError::Failed("load rejected".to_string()));
        }
        self.shared.record(
            self.slot,
            DriverCall::Load {
                media_id: media_id.to_string(),
                start_seconds,
            },
        );
        // Restarts (position 0) don't wait for readiness
        if let (Some(delay), true) = (self.ready_delay, start_seconds > 0.0) {
            let signals = self.signals.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = signals.send(DriverSignal::Ready);
            });
        }
        Ok(())
    }

    fn play(&self) -> Result<(), DriverError> {
        self.shared.record(self.slot, DriverCall::Play);
        Ok(())
    }

    fn pause(&self) -> Result<(), DriverError> {
        self.shared.record(self.slot, DriverCall::Pause);
        Ok(())
    }

    fn mute(&self) -> Result<(), DriverError> {
        self.shared.record(self.slot, DriverCall::Mute);
        Ok(())
    }

    fn seek(&self, seconds: f64) -> Result<(), DriverError> {
        self.shared.record(self.slot, DriverCall::Seek(seconds));
        Ok(())
    }

    fn destroy(&self) -> Result<(), DriverError> {
        self.shared.record(self.slot, DriverCall::Destroy);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualCall {
    Transition(Option<Duration>),
    Opacity(Opacity),
    Stack(StackOrder),
    Flush,
}

/// Renderer stand-in recording style changes per slot
pub struct RecordingTransitions {
    calls: Mutex<Vec<(Instant, SurfaceSlot, VisualCall)>>,
    frame_interval: Duration,
}

impl RecordingTransitions {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            frame_interval: Duration::from_millis(16),
        }
    }

    pub fn calls_on(&self, slot: usize) -> Vec<VisualCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s, _)| s.index() == slot)
            .map(|(_, _, c)| c.clone())
            .collect()
    }

    pub fn first_at(&self, slot: usize, call: &VisualCall) -> Option<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(_, s, c)| s.index() == slot && c == call)
            .map(|(at, _, _)| *at)
    }

    /// Every recorded call in order, as (time, slot index, call)
    pub fn timeline(&self) -> Vec<(Instant, usize, VisualCall)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(at, s, c)| (*at, s.index(), c.clone()))
            .collect()
    }

    fn record(&self, slot: SurfaceSlot, call: VisualCall) {
        self.calls.lock().unwrap().push((Instant::now(), slot, call));
    }
}

#[async_trait]
impl TransitionDriver for RecordingTransitions {
    fn apply_transition(&self, slot: SurfaceSlot, duration: Option<Duration>) {
        self.record(slot, VisualCall::Transition(duration));
    }

    fn set_opacity(&self, slot: SurfaceSlot, opacity: Opacity) {
        self.record(slot, VisualCall::Opacity(opacity));
    }

    fn set_stack_order(&self, slot: SurfaceSlot, order: StackOrder) {
        self.record(slot, VisualCall::Stack(order));
    }

    fn flush_layout(&self, slot: SurfaceSlot) {
        self.record(slot, VisualCall::Flush);
    }

    async fn next_frame(&self) {
        tokio::time::sleep(self.frame_interval).await;
    }
}
