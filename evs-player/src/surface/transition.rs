//! Visual transition interface
//!
//! Pure visual side effects: opacity, stacking order and the transition
//! duration applied to a surface's style. Nothing here affects playback.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which of the two surfaces a call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SurfaceSlot(pub usize);

impl SurfaceSlot {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SurfaceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Opacity {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StackOrder {
    Back,
    Front,
}

/// Renderer-side animation driver
#[async_trait]
pub trait TransitionDriver: Send + Sync {
    /// Set the opacity transition duration; `None` disables the transition
    fn apply_transition(&self, slot: SurfaceSlot, duration: Option<Duration>);

    fn set_opacity(&self, slot: SurfaceSlot, opacity: Opacity);

    fn set_stack_order(&self, slot: SurfaceSlot, order: StackOrder);

    /// Force pending style writes to be laid out before the next write
    fn flush_layout(&self, slot: SurfaceSlot);

    /// Resolve after the renderer has produced one frame
    async fn next_frame(&self);
}
