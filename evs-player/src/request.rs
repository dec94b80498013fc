//! Switch requests and their delivery
//!
//! Requests arrive as JSON in the controller's wire format:
//!
//! ```json
//! {"platform": "youtube", "videoId": "dQw4w9WgXcQ", "targetTime": 42.0,
//!  "systemUnixTime": 1700000000000, "syncEnabled": true, "page": 1, "duration": 212}
//! ```
//!
//! Only the most recent request matters: [`RequestSource`] is backed by a
//! watch channel, so a request published while an older one is still
//! unobserved replaces it.

use crate::backend::BackendId;
use crate::error::{Error, Result};
use serde::Deserialize;
use tokio::sync::watch;

/// A validated instruction to show media at a position at a wall-clock time
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireRequest")]
pub struct SwitchRequest {
    pub backend: BackendId,
    pub media_id: String,
    /// Media position (seconds) to show at the wall-clock target
    pub target_position_seconds: f64,
    /// Unix epoch milliseconds at which `target_position_seconds` should be on screen
    pub wall_clock_target_millis: i64,
    pub sync_enabled: bool,
    /// Multi-part selector (1-based)
    pub page: u32,
    /// Total media duration when known
    pub duration_seconds: Option<f64>,
}

impl SwitchRequest {
    pub fn new(
        backend: BackendId,
        media_id: impl Into<String>,
        target_position_seconds: f64,
        wall_clock_target_millis: i64,
    ) -> Self {
        Self {
            backend,
            media_id: media_id.into(),
            target_position_seconds,
            wall_clock_target_millis,
            sync_enabled: true,
            page: 1,
            duration_seconds: None,
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = normalize_duration(Some(seconds));
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn without_sync(mut self) -> Self {
        self.sync_enabled = false;
        self
    }

    /// Parse and validate a JSON request body
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| Error::InvalidRequest(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.media_id.trim().is_empty() {
            return Err(Error::InvalidRequest("media id must not be empty".to_string()));
        }
        if !self.target_position_seconds.is_finite() || self.target_position_seconds < 0.0 {
            return Err(Error::InvalidRequest(format!(
                "target position must be a non-negative number, got {}",
                self.target_position_seconds
            )));
        }
        if self.page == 0 {
            return Err(Error::InvalidRequest("page is 1-based".to_string()));
        }
        Ok(())
    }
}

/// Unknown or non-positive durations mean "unknown"
fn normalize_duration(duration: Option<f64>) -> Option<f64> {
    duration.filter(|d| d.is_finite() && *d > 0.0)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    #[serde(default)]
    platform: BackendId,
    video_id: String,
    target_time: f64,
    system_unix_time: f64,
    #[serde(default = "default_sync_enabled")]
    sync_enabled: bool,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default)]
    duration: Option<f64>,
}

fn default_sync_enabled() -> bool {
    true
}

fn default_page() -> u32 {
    1
}

impl TryFrom<WireRequest> for SwitchRequest {
    type Error = String;

    fn try_from(wire: WireRequest) -> std::result::Result<Self, Self::Error> {
        if !wire.system_unix_time.is_finite() {
            return Err("systemUnixTime must be a number".to_string());
        }
        let request = SwitchRequest {
            backend: wire.platform,
            media_id: wire.video_id,
            target_position_seconds: wire.target_time,
            wall_clock_target_millis: wire.system_unix_time.round() as i64,
            sync_enabled: wire.sync_enabled,
            page: wire.page,
            duration_seconds: normalize_duration(wire.duration),
        };
        request.validate().map_err(|e| e.to_string())?;
        Ok(request)
    }
}

/// Sending half; publishing replaces any request not yet picked up
#[derive(Debug, Clone)]
pub struct RequestPublisher {
    tx: watch::Sender<Option<SwitchRequest>>,
}

impl RequestPublisher {
    pub fn publish(&self, request: SwitchRequest) {
        self.tx.send_replace(Some(request));
    }
}

/// Receiving half of the request channel
#[derive(Debug)]
pub struct RequestSource {
    rx: watch::Receiver<Option<SwitchRequest>>,
}

impl RequestSource {
    /// Wait for the next request; `None` once every publisher is gone
    pub async fn next(&mut self) -> Option<SwitchRequest> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(request) = self.rx.borrow_and_update().clone() {
                return Some(request);
            }
        }
    }
}

pub fn request_channel() -> (RequestPublisher, RequestSource) {
    let (tx, rx) = watch::channel(None);
    (RequestPublisher { tx }, RequestSource { rx })
}
