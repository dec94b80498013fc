//! # EVS Common Library
//!
//! Shared code for the EVS synchronized-playback services including:
//! - Event types (EvsEvent enum)
//! - Configuration file resolution
//! - Wall-clock time utilities
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
