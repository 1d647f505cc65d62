//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{CountdownSnapshot, Phase};

/// Body of every control endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl ApiResponse {
    /// Create a successful response
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Utc::now(),
            url: None,
            enabled: None,
        }
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

/// Body of 4xx answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Countdown read-out polled by the control panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownResponse {
    pub remaining: f64,
    pub formatted: String,
    /// ISO 8601 local time, `null` before the first start
    pub target: Option<String>,
    pub running: bool,
    pub phase: Phase,
}

impl CountdownResponse {
    pub fn new(snapshot: &CountdownSnapshot, running: bool) -> Self {
        Self {
            remaining: snapshot.remaining,
            formatted: snapshot.formatted(),
            target: snapshot.target.map(|t| t.to_rfc3339()),
            running,
            phase: snapshot.phase,
        }
    }
}

/// Server status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub phase: Phase,
    pub running: bool,
    pub speak_intervals: bool,
    pub music_url: String,
    pub camera_available: bool,
    pub viewers: usize,
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
