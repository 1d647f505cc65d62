//! Simulated robot for headless runs and tests

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use tracing::debug;

use super::{PoseCommand, PoseSink, RobotError};

/// Most recent commands kept by [`SimulatedRobot::history`].
pub const HISTORY_LIMIT: usize = 1024;

/// Accepts every command, logs it and keeps the recent history.
#[derive(Debug, Default)]
pub struct SimulatedRobot {
    history: Mutex<VecDeque<PoseCommand>>,
    commands: AtomicUsize,
    failing: AtomicBool,
    failures: AtomicUsize,
}

impl SimulatedRobot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following command fail with a timeout (still recorded).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The last [`HISTORY_LIMIT`] commands, oldest first.
    pub fn history(&self) -> Vec<PoseCommand> {
        self.history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every command received, including those no longer in the history.
    pub fn command_count(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    /// Number of commands that were answered with an error.
    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn last_command(&self) -> Option<PoseCommand> {
        self.history.lock().ok().and_then(|history| history.back().cloned())
    }
}

#[async_trait]
impl PoseSink for SimulatedRobot {
    async fn goto_target(&self, command: &PoseCommand) -> Result<(), RobotError> {
        debug!(
            "[sim] head={:?} antennas={:?} duration={:?}",
            command.head, command.antennas, command.duration
        );
        self.commands.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut history) = self.history.lock() {
            if history.len() == HISTORY_LIMIT {
                history.pop_front();
            }
            history.push_back(command.clone());
        }

        if self.failing.load(Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(RobotError::Timeout(command.duration));
        }
        Ok(())
    }
}
