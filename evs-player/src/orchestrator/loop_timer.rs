//! Loop emulation for back-ends without native looping
//!
//! A single pending timer restarts the active surface when its media is
//! expected to have ended. Arming a new timer or cancelling aborts the
//! previous task and bumps the generation, so a task that already woke up
//! can tell it has been superseded.

use evs_common::time::seconds_to_duration;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delay until the media ends, plus margin
///
/// `None` when the media is expected to have ended already.
pub fn loop_delay(
    duration_seconds: f64,
    start_position_seconds: f64,
    elapsed_seconds: f64,
    margin_seconds: f64,
) -> Option<Duration> {
    let remaining = duration_seconds - start_position_seconds - elapsed_seconds;
    if remaining <= 0.0 {
        return None;
    }
    Some(seconds_to_duration(remaining + margin_seconds))
}

#[derive(Debug, Default)]
pub struct LoopTimer {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl LoopTimer {
    /// Abort the pending timer, if any; returns whether one was pending
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        match self.handle.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    /// Cancel any pending timer and reserve a generation for the next one
    pub fn begin(&mut self) -> u64 {
        self.cancel();
        self.generation
    }

    /// Attach the task started for `generation`
    ///
    /// A stale generation means another timer was armed in between; the
    /// task is aborted instead of stored.
    pub fn attach(&mut self, generation: u64, handle: JoinHandle<()>) {
        if generation == self.generation {
            self.handle = Some(handle);
        } else {
            handle.abort();
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for LoopTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
