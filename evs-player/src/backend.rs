//! Video back-end identifiers and their capability matrix
//!
//! The orchestrator never branches on back-end names; it asks for
//! [`Capabilities`] and acts on those.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported video platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    /// Precise back-end: readiness callback, seek, native loop
    #[default]
    YouTube,
    /// Embed-only back-end: no readiness signal, no seek, no loop
    Bilibili,
}

impl BackendId {
    /// All known back-ends, in report order
    pub const ALL: [BackendId; 2] = [BackendId::YouTube, BackendId::Bilibili];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::YouTube => "youtube",
            BackendId::Bilibili => "bilibili",
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            BackendId::YouTube => Capabilities {
                seekable: true,
                native_loop: true,
                readiness_signaled: true,
                mute_required: true,
            },
            BackendId::Bilibili => Capabilities {
                seekable: false,
                native_loop: false,
                readiness_signaled: false,
                mute_required: false,
            },
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(BackendId::YouTube),
            "bilibili" => Ok(BackendId::Bilibili),
            other => Err(format!("unknown back-end: {}", other)),
        }
    }
}

/// One value per back-end, addressed by [`BackendId`]
#[derive(Debug, Clone, Default)]
pub struct PerBackend<T> {
    pub youtube: T,
    pub bilibili: T,
}

impl<T> PerBackend<T> {
    /// Build a value for every back-end
    pub fn from_fn(mut f: impl FnMut(BackendId) -> T) -> Self {
        Self {
            youtube: f(BackendId::YouTube),
            bilibili: f(BackendId::Bilibili),
        }
    }

    pub fn get(&self, backend: BackendId) -> &T {
        match backend {
            BackendId::YouTube => &self.youtube,
            BackendId::Bilibili => &self.bilibili,
        }
    }

    pub fn get_mut(&mut self, backend: BackendId) -> &mut T {
        match backend {
            BackendId::YouTube => &mut self.youtube,
            BackendId::Bilibili => &mut self.bilibili,
        }
    }
}

/// What a back-end can do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// Supports programmatic seek
    pub seekable: bool,
    /// Replays by itself when the end-of-media signal arrives
    pub native_loop: bool,
    /// Reports exact readiness; otherwise the caller waits a fixed time
    pub readiness_signaled: bool,
    /// Must be muted before play; otherwise muting is best-effort
    pub mute_required: bool,
}
