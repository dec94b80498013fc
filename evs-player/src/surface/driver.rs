//! Back-end driver interface
//!
//! A driver is the embed of one video platform inside one surface. The
//! surface owns it exclusively; readiness and end-of-media arrive as
//! [`DriverSignal`]s on the channel handed over at creation.

use crate::backend::BackendId;
use crate::surface::SurfaceSlot;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Driver call failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    /// The back-end has no such operation
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// The back-end API call failed
    #[error("back-end call failed: {0}")]
    Failed(String),
}

/// Asynchronous notifications from a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverSignal {
    /// Loaded media is buffered and playing at the requested position
    Ready,
    /// Playback reached the end of the media
    Ended,
}

pub type SignalSender = mpsc::UnboundedSender<DriverSignal>;

/// Control surface of one embedded player
///
/// Calls are fire-and-forget; they return as soon as the command was issued.
pub trait BackendDriver: Send + Sync {
    /// Load media and start buffering at `start_seconds`
    fn load(&self, media_id: &str, start_seconds: f64, page: u32) -> Result<(), DriverError>;

    fn play(&self) -> Result<(), DriverError>;

    fn pause(&self) -> Result<(), DriverError>;

    fn mute(&self) -> Result<(), DriverError>;

    /// Seek to an absolute position; back-ends without seek keep the default
    fn seek(&self, _seconds: f64) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("seek"))
    }

    /// Tear down the embed and everything it allocated
    fn destroy(&self) -> Result<(), DriverError>;
}

/// Creates drivers for a back-end on demand
pub trait DriverFactory: Send + Sync {
    fn create(
        &self,
        backend: BackendId,
        slot: SurfaceSlot,
        signals: SignalSender,
    ) -> Result<Arc<dyn BackendDriver>, DriverError>;
}
