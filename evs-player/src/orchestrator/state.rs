//! Orchestrator state and the busy flag

use crate::backend::BackendId;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Where the in-flight switch currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SwitchPhase {
    #[default]
    Idle,
    Loading,
    Aligning,
    Transitioning,
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorState {
    /// Index (0 or 1) of the visible surface
    pub active_index: usize,
    pub phase: SwitchPhase,
    /// Incremented for every accepted switch
    pub switch_sequence: u64,
    pub last_media_id: Option<String>,
    pub last_backend: Option<BackendId>,
}

impl OrchestratorState {
    pub fn standby_index(&self) -> usize {
        1 - self.active_index
    }

    /// Whether a request targets what is already on screen
    pub fn is_same_media(&self, backend: BackendId, media_id: &str) -> bool {
        self.last_backend == Some(backend) && self.last_media_id.as_deref() == Some(media_id)
    }
}

/// Serializable view for the HTTP API
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSnapshot {
    pub active_surface: usize,
    pub phase: SwitchPhase,
    pub transitioning: bool,
    pub switch_sequence: u64,
    pub last_media_id: Option<String>,
    pub last_backend: Option<BackendId>,
    pub loop_timer_armed: bool,
}

/// Holds the busy flag for the lifetime of one switch
///
/// Released on drop, so an abandoned or panicking switch still frees it.
pub struct TransitionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TransitionGuard<'a> {
    /// Take the flag, or `None` if a switch is already running
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_is_exclusive() {
        let flag = AtomicBool::new(false);

        let guard = TransitionGuard::acquire(&flag).unwrap();
        assert!(TransitionGuard::acquire(&flag).is_none());
        assert!(flag.load(Ordering::Acquire));

        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(TransitionGuard::acquire(&flag).is_some());
    }

    #[test]
    fn test_same_media() {
        let state = OrchestratorState {
            last_backend: Some(BackendId::YouTube),
            last_media_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(state.is_same_media(BackendId::YouTube, "abc"));
        assert!(!state.is_same_media(BackendId::Bilibili, "abc"));
        assert!(!state.is_same_media(BackendId::YouTube, "xyz"));
        assert_eq!(state.standby_index(), 1);
    }
}
