//! Executes choreography steps against a pose sink

use std::sync::Arc;

use tracing::warn;

use crate::{
    choreography::Step,
    robot::{PoseCommand, PoseSink},
    utils::StopSignal,
};

/// Submits moves and paces them with stop-aware sleeps.
///
/// A failed move is logged and skipped; the routine carries on with the
/// next step. Nothing is retried.
#[derive(Clone)]
pub struct Performer {
    robot: Arc<dyn PoseSink>,
    stop: StopSignal,
}

impl Performer {
    pub fn new(robot: Arc<dyn PoseSink>, stop: StopSignal) -> Self {
        Self { robot, stop }
    }

    /// Submit one command without waiting for its duration.
    pub async fn submit(&self, command: &PoseCommand) {
        if let Err(e) = self.robot.goto_target(command).await {
            if e.is_timeout() {
                warn!("Movement timeout (continuing): {}", e);
            } else {
                warn!("Movement failed (continuing): {}", e);
            }
        }
    }

    /// Run one step. Returns `false` if the stop signal interrupted it.
    pub async fn step(&self, step: &Step) -> bool {
        if self.stop.is_set() {
            return false;
        }
        match step {
            Step::Move(command) => {
                self.submit(command).await;
                self.stop.sleep(command.duration).await
            }
            Step::Pause(duration) => self.stop.sleep(*duration).await,
        }
    }

    /// Run a whole routine. Returns `false` if it was cut short by the stop signal.
    pub async fn perform(&self, steps: &[Step]) -> bool {
        for step in steps {
            if !self.step(step).await {
                return false;
            }
        }
        true
    }
}
