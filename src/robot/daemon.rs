//! HTTP client for the Reachy Mini daemon

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::{PoseCommand, PoseSink, RobotError};

/// Per-request timeout. Motion requests are acknowledged immediately by the
/// daemon, so anything slower than this means the daemon is stuck.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Talks to the daemon's REST API.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

/// Head target as the daemon expects it: position in meters, angles in radians.
#[derive(Debug, Serialize)]
struct HeadTarget {
    x: f64,
    y: f64,
    z: f64,
    roll: f64,
    pitch: f64,
    yaw: f64,
}

#[derive(Debug, Serialize)]
struct GotoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    head_pose: Option<HeadTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    antennas: Option<[f64; 2]>,
    duration: f64,
    interpolation: &'static str,
}

impl From<&PoseCommand> for GotoRequest {
    fn from(command: &PoseCommand) -> Self {
        Self {
            head_pose: command.head.map(|head| HeadTarget {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                roll: head.roll.to_radians(),
                pitch: head.pitch.to_radians(),
                yaw: head.yaw.to_radians(),
            }),
            antennas: command.antennas.map(|a| [a.left, a.right]),
            duration: command.duration.as_secs_f64(),
            interpolation: "minjerk",
        }
    }
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Result<Self, RobotError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RobotError::Connection(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RobotError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(RobotError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl From<reqwest::Error> for RobotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RobotError::Timeout(REQUEST_TIMEOUT)
        } else if err.is_decode() {
            RobotError::Parse(err.to_string())
        } else {
            RobotError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl PoseSink for DaemonClient {
    async fn goto_target(&self, command: &PoseCommand) -> Result<(), RobotError> {
        let body = GotoRequest::from(command);
        debug!("goto {:?}", body);

        let response = self
            .http
            .post(self.url("/api/move/goto"))
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn connect(&self) -> Result<(), RobotError> {
        info!("Connecting to Reachy Mini daemon at {}", self.base_url);
        let response = self.http.get(self.url("/api/daemon/status")).send().await?;
        let status: serde_json::Value = Self::check_status(response).await?.json().await?;
        debug!("Daemon status: {}", status);
        info!("Reachy Mini daemon is reachable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::{Antennas, HeadPose};

    #[test]
    fn test_goto_request_converts_degrees_to_radians() {
        let command = PoseCommand::secs(0.4).head(HeadPose::new(0.0, -90.0, 180.0));
        let body = serde_json::to_value(GotoRequest::from(&command)).unwrap();

        let pitch = body["head_pose"]["pitch"].as_f64().unwrap();
        let yaw = body["head_pose"]["yaw"].as_f64().unwrap();
        assert!((pitch + std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!((yaw - std::f64::consts::PI).abs() < 1e-9);
        assert!(body.get("antennas").is_none());
        assert_eq!(body["duration"], 0.4);
    }

    #[test]
    fn test_goto_request_antennas_only() {
        let command = PoseCommand::secs(0.2).antennas(Antennas::new(0.7, -0.7));
        let body = serde_json::to_value(GotoRequest::from(&command)).unwrap();

        assert!(body.get("head_pose").is_none());
        assert_eq!(body["antennas"], serde_json::json!([0.7, -0.7]));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = DaemonClient::new("http://reachy-mini.local:8000/").unwrap();
        assert_eq!(client.base_url(), "http://reachy-mini.local:8000");
        assert_eq!(client.url("/api/move/goto"), "http://reachy-mini.local:8000/api/move/goto");
    }
}
