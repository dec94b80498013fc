//! EVS Player Library
//!
//! Synchronized dual-surface video playback: adaptive load-time estimation,
//! playback surfaces over pluggable back-end drivers, and the switch
//! orchestrator that cross-fades between them on a wall-clock schedule.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod estimator;
pub mod orchestrator;
pub mod request;
pub mod sim;
pub mod surface;

pub use backend::BackendId;
pub use error::{Error, Result};
pub use orchestrator::{SwitchOrchestrator, SwitchOutcome};
pub use request::SwitchRequest;
