//! Event types for the EVS event system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// EVS event types
///
/// Emitted by the switch orchestrator and streamed to clients over SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EvsEvent {
    /// A switch request was accepted and loading has begun
    SwitchStarted {
        sequence: u64,
        backend: String,
        media_id: String,
        lookahead_seconds: f64,
        same_media: bool,
        timestamp: DateTime<Utc>,
    },

    /// The standby surface is now the visible one
    SwitchCompleted {
        sequence: u64,
        backend: String,
        media_id: String,
        active_surface: usize,
        total_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A request arrived while another switch was in flight and was dropped
    SwitchRejected {
        backend: String,
        media_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A switch was abandoned after an error
    SwitchFailed {
        sequence: u64,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Load overran the wall-clock deadline and the surface was seeked forward
    LateCorrection {
        sequence: u64,
        backend: String,
        late_ms: u64,
        seek_to_seconds: f64,
        timestamp: DateTime<Utc>,
    },

    /// Loop emulation restarted the active surface from position 0
    LoopRestarted {
        backend: String,
        media_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl EvsEvent {
    /// SSE event name for this event
    pub fn event_type(&self) -> &'static str {
        match self {
            EvsEvent::SwitchStarted { .. } => "SwitchStarted",
            EvsEvent::SwitchCompleted { .. } => "SwitchCompleted",
            EvsEvent::SwitchRejected { .. } => "SwitchRejected",
            EvsEvent::SwitchFailed { .. } => "SwitchFailed",
            EvsEvent::LateCorrection { .. } => "LateCorrection",
            EvsEvent::LoopRestarted { .. } => "LoopRestarted",
        }
    }
}
