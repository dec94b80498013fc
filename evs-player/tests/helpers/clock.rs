//! Wall clock driven by tokio time
//!
//! Under `start_paused` the runtime auto-advances time, so wall-clock
//! deadlines in requests line up with sleeps inside the orchestrator.

use evs_common::time::WallClock;
use tokio::time::Instant;

pub struct PausedClock {
    origin: Instant,
    origin_millis: i64,
}

impl PausedClock {
    /// An arbitrary fixed epoch keeps test output stable
    pub const ORIGIN_MILLIS: i64 = 1_700_000_000_000;

    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            origin_millis: Self::ORIGIN_MILLIS,
        }
    }
}

impl WallClock for PausedClock {
    fn now_millis(&self) -> i64 {
        self.origin_millis + self.origin.elapsed().as_millis() as i64
    }
}
