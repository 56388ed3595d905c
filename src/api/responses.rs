//! API request and response structures

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    state::{RunState, TimerSnapshot},
    utils::{countdown_string, hms::as_seconds_f64, hms_string},
};

/// Body of `POST /timers`
///
/// The duration is given the way a time picker would produce it: each
/// component is optional and bounded, and the total must be positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

impl CreateTimerRequest {
    /// Validate the picker components and combine them
    pub fn duration(&self) -> Result<Duration, String> {
        if self.hours >= 24 {
            return Err(format!("hours must be below 24, got {}", self.hours));
        }
        if self.minutes >= 60 {
            return Err(format!("minutes must be below 60, got {}", self.minutes));
        }
        if self.seconds >= 60 {
            return Err(format!("seconds must be below 60, got {}", self.seconds));
        }

        let total = i64::from(self.hours) * 3600 + i64::from(self.minutes) * 60 + i64::from(self.seconds);
        if total == 0 {
            return Err("timer duration must be greater than zero".to_string());
        }
        Ok(Duration::seconds(total))
    }
}

/// Body of `POST /timers/reorder`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

/// A timer as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub identifier: String,
    pub name: String,
    pub state: RunState,
    pub configured_seconds: f64,
    /// `HH:MM:SS`
    pub configured: String,
    pub remaining_seconds: f64,
    /// `HH:MM:SS`, rounded up
    pub remaining: String,
}

impl From<TimerSnapshot> for TimerView {
    fn from(snapshot: TimerSnapshot) -> Self {
        Self {
            configured_seconds: as_seconds_f64(snapshot.configured),
            configured: hms_string(snapshot.configured),
            remaining_seconds: as_seconds_f64(snapshot.remaining),
            remaining: countdown_string(snapshot.remaining),
            identifier: snapshot.identifier,
            name: snapshot.name,
            state: snapshot.state,
        }
    }
}

/// API response structure for commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
}

impl ApiResponse {
    /// Create a successful response, optionally carrying the affected timer
    pub fn ok(message: impl Into<String>, timer: Option<TimerView>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Ordered list of all timers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerListResponse {
    pub count: usize,
    pub timers: Vec<TimerView>,
    pub timestamp: DateTime<Utc>,
}

impl TimerListResponse {
    pub fn new(snapshots: Vec<TimerSnapshot>) -> Self {
        let timers: Vec<TimerView> = snapshots.into_iter().map(TimerView::from).collect();
        Self {
            count: timers.len(),
            timers,
            timestamp: Utc::now(),
        }
    }
}

/// Status response with a per-state summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timers: usize,
    pub running: usize,
    pub paused: usize,
    pub stopped: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
