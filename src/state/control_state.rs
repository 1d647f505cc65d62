//! Control state written by the web layer and consumed by the run loop

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::debug;

/// Countdown length used when a start request does not name one.
pub const DEFAULT_START_SECONDS: f64 = 30.0;

/// Longest countdown accepted, in either direction (a leap year).
pub const MAX_START_SECONDS: f64 = 366.0 * 24.0 * 3600.0;

/// A user request waiting for the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    Start { seconds: f64 },
    Stop,
    Reset,
}

impl ControlAction {
    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::Start { .. } => "start",
            ControlAction::Stop => "stop",
            ControlAction::Reset => "reset",
        }
    }
}

/// Everything behind the lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controls {
    /// Single-slot mailbox; `None` when nothing is pending
    pub action: Option<ControlAction>,
    /// Mirror of "a countdown is active", maintained by the run loop
    pub running: bool,
    pub easter_egg: bool,
    pub music_url: String,
    pub speak_intervals: bool,
}

/// Control record shared between the HTTP handlers and the run loop.
///
/// Field ownership is encoded in the accessors: handlers post actions and
/// change settings, the run loop takes actions, maintains `running` and
/// consumes the easter egg.
#[derive(Debug)]
pub struct ControlState {
    inner: Mutex<Controls>,
    posted: Notify,
}

impl ControlState {
    pub fn new(music_url: String, speak_intervals: bool) -> Self {
        Self {
            inner: Mutex::new(Controls {
                action: None,
                running: false,
                easter_egg: false,
                music_url,
                speak_intervals,
            }),
            posted: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Controls> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Controls {
        self.lock().clone()
    }

    // Control surface side

    /// Put `action` in the mailbox, replacing anything still pending.
    pub fn post(&self, action: ControlAction) {
        let replaced = self.lock().action.replace(action);
        if let Some(previous) = replaced {
            debug!("Pending {} replaced by {}", previous.name(), action.name());
        }
        self.posted.notify_one();
    }

    pub fn set_music_url(&self, url: String) {
        self.lock().music_url = url;
    }

    pub fn set_speak_intervals(&self, enabled: bool) {
        self.lock().speak_intervals = enabled;
    }

    pub fn trigger_easter_egg(&self) {
        self.lock().easter_egg = true;
    }

    // Run loop side

    /// Take the pending action, leaving the mailbox empty.
    pub fn take_action(&self) -> Option<ControlAction> {
        self.lock().action.take()
    }

    pub fn set_running(&self, running: bool) {
        self.lock().running = running;
    }

    /// Read and clear the easter egg flag.
    pub fn take_easter_egg(&self) -> bool {
        std::mem::take(&mut self.lock().easter_egg)
    }

    /// Resolves once an action has been posted since the last wake-up.
    pub async fn action_posted(&self) {
        self.posted.notified().await
    }

    // Readers

    pub fn pending_action(&self) -> Option<ControlAction> {
        self.lock().action
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn music_url(&self) -> String {
        self.lock().music_url.clone()
    }

    pub fn speak_intervals(&self) -> bool {
        self.lock().speak_intervals
    }

    pub fn easter_egg_armed(&self) -> bool {
        self.lock().easter_egg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn control() -> ControlState {
        ControlState::new("https://example.com/song".to_string(), false)
    }

    #[test]
    fn test_take_action_clears_mailbox() {
        let control = control();
        control.post(ControlAction::Start { seconds: 12.0 });

        assert_eq!(control.take_action(), Some(ControlAction::Start { seconds: 12.0 }));
        assert_eq!(control.take_action(), None);
        assert_eq!(control.pending_action(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let control = control();
        control.post(ControlAction::Start { seconds: 5.0 });
        control.post(ControlAction::Stop);
        control.post(ControlAction::Reset);

        assert_eq!(control.take_action(), Some(ControlAction::Reset));
        assert_eq!(control.take_action(), None);
    }

    #[test]
    fn test_easter_egg_is_consumed_once() {
        let control = control();
        assert!(!control.take_easter_egg());

        control.trigger_easter_egg();
        assert!(control.easter_egg_armed());
        assert!(control.take_easter_egg());
        assert!(!control.take_easter_egg());
    }

    #[test]
    fn test_settings() {
        let control = control();
        control.set_music_url("https://example.com/other".to_string());
        control.set_speak_intervals(true);
        control.set_running(true);

        let snapshot = control.snapshot();
        assert_eq!(snapshot.music_url, "https://example.com/other");
        assert!(snapshot.speak_intervals);
        assert!(snapshot.running);
    }

    #[tokio::test]
    async fn test_post_wakes_waiter() {
        let control = std::sync::Arc::new(control());
        let waiter = std::sync::Arc::clone(&control);
        let handle = tokio::spawn(async move { waiter.action_posted().await });

        control.post(ControlAction::Stop);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[test]
    fn test_action_serialization() {
        let json = serde_json::to_value(ControlAction::Start { seconds: 30.0 }).unwrap();
        assert_eq!(json, serde_json::json!({"action": "start", "seconds": 30.0}));
        let json = serde_json::to_value(ControlAction::Stop).unwrap();
        assert_eq!(json, serde_json::json!({"action": "stop"}));
    }
}
