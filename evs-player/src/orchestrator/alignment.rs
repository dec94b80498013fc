//! Wall-clock alignment decision
//!
//! After the standby surface is buffered, the time left until the deadline
//! (`wall_clock_target + lookahead`) decides what happens next. A dead band
//! around zero is treated as on time.

use crate::config::SyncSettings;
use evs_common::time::millis_to_duration;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Alignment {
    /// Early: sleep until the deadline
    Wait(Duration),
    /// Late on a seekable back-end: seek forward by the lateness
    Correct { late_ms: f64 },
    /// Late on a back-end that cannot seek; nothing to do
    Uncorrectable { late_ms: f64 },
    /// Within the dead band
    OnTime,
}

/// Decide how to align given the milliseconds remaining to the deadline
pub fn plan_alignment(remaining_ms: f64, seekable: bool, sync: &SyncSettings) -> Alignment {
    if remaining_ms > sync.wait_threshold_ms as f64 {
        Alignment::Wait(millis_to_duration(remaining_ms.ceil() as u64))
    } else if remaining_ms < sync.late_threshold_ms as f64 {
        let late_ms = -remaining_ms;
        if seekable {
            Alignment::Correct { late_ms }
        } else {
            Alignment::Uncorrectable { late_ms }
        }
    } else {
        Alignment::OnTime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_early_waits() {
        let sync = SyncSettings::default();
        assert_eq!(
            plan_alignment(2000.0, true, &sync),
            Alignment::Wait(Duration::from_millis(2000))
        );
        // Non-seekable back-ends still honour the wait
        assert_eq!(
            plan_alignment(51.0, false, &sync),
            Alignment::Wait(Duration::from_millis(51))
        );
    }

    #[test]
    fn test_dead_band() {
        let sync = SyncSettings::default();
        for remaining in [50.0, 0.0, -20.0, -100.0] {
            assert_eq!(plan_alignment(remaining, true, &sync), Alignment::OnTime);
        }
    }

    #[test]
    fn test_late_corrects_only_when_seekable() {
        let sync = SyncSettings::default();
        assert_eq!(
            plan_alignment(-500.0, true, &sync),
            Alignment::Correct { late_ms: 500.0 }
        );
        assert_eq!(
            plan_alignment(-500.0, false, &sync),
            Alignment::Uncorrectable { late_ms: 500.0 }
        );
    }
}
