//! Error types for evs-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for evs-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Back-end driver errors
    #[error("Driver error: {0}")]
    Driver(#[from] crate::surface::DriverError),

    /// Malformed or out-of-range switch request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Errors bubbled up from evs-common
    #[error(transparent)]
    Common(#[from] evs_common::Error),
}

/// Convenience Result type using evs-player Error
pub type Result<T> = std::result::Result<T, Error>;
