//! Robot motion module
//!
//! The run loop only ever talks to the robot through [`PoseSink`]. Two sinks
//! ship with the crate: the HTTP client for the Reachy Mini daemon and a
//! simulated robot that logs and records every command.

pub mod daemon;
pub mod simulated;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use daemon::DaemonClient;
pub use simulated::SimulatedRobot;

/// Head orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl HeadPose {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Head facing forward, tilted by `pitch` degrees.
    pub fn pitched(pitch: f64) -> Self {
        Self::new(0.0, pitch, 0.0)
    }
}

/// Antenna positions in radians, `(left, right)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Antennas {
    pub left: f64,
    pub right: f64,
}

impl Antennas {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Both antennas at the same position.
    pub fn both(position: f64) -> Self {
        Self::new(position, position)
    }
}

/// One motion request: optional head target, optional antenna target, and
/// the nominal time the robot should take to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseCommand {
    pub head: Option<HeadPose>,
    pub antennas: Option<Antennas>,
    pub duration: Duration,
}

impl PoseCommand {
    pub fn new(duration: Duration) -> Self {
        Self {
            head: None,
            antennas: None,
            duration,
        }
    }

    /// Convenience constructor taking the duration in seconds.
    pub fn secs(duration: f64) -> Self {
        Self::new(Duration::from_secs_f64(duration))
    }

    pub fn head(mut self, head: HeadPose) -> Self {
        self.head = Some(head);
        self
    }

    pub fn antennas(mut self, antennas: Antennas) -> Self {
        self.antennas = Some(antennas);
        self
    }

    /// Head up, antennas down: the pose the robot rests in between countdowns.
    pub fn neutral() -> Self {
        Self::secs(0.8)
            .head(HeadPose::pitched(-30.0))
            .antennas(Antennas::both(0.0))
    }
}

/// Errors a pose sink can report.
#[derive(Debug, thiserror::Error)]
pub enum RobotError {
    /// The robot did not acknowledge the command in time
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
    /// Could not reach the robot
    #[error("Connection error: {0}")]
    Connection(String),
    /// The robot answered but refused the command
    #[error("Robot rejected command (status {status}): {message}")]
    Rejected { status: u16, message: String },
    /// Response could not be understood
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RobotError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RobotError::Timeout(_))
    }
}

/// Capability to move the robot.
///
/// `goto_target` submits the command and returns once the robot has accepted
/// it; callers pace themselves with a local sleep of `command.duration`.
#[async_trait]
pub trait PoseSink: Send + Sync {
    async fn goto_target(&self, command: &PoseCommand) -> Result<(), RobotError>;

    /// Check the robot is reachable. Called once at startup.
    async fn connect(&self) -> Result<(), RobotError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_pose_keeps_head_up() {
        let pose = PoseCommand::neutral();
        assert_eq!(pose.head, Some(HeadPose::pitched(-30.0)));
        assert_eq!(pose.antennas, Some(Antennas::both(0.0)));
        assert_eq!(pose.duration, Duration::from_millis(800));
    }

    #[test]
    fn test_builder_leaves_unset_parts_empty() {
        let pose = PoseCommand::secs(0.25).antennas(Antennas::new(0.8, -0.8));
        assert!(pose.head.is_none());
        assert_eq!(pose.antennas.unwrap().right, -0.8);
    }

    #[test]
    fn test_timeout_classification() {
        assert!(RobotError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!RobotError::Connection("refused".into()).is_timeout());
    }
}
