//! Main application state shared by the HTTP server and the background tasks

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{ControlAction, ControlState, CountdownState};
use crate::{
    media::{FrameSource, MjpegBroadcaster},
    utils::StopSignal,
};

/// Everything the control surface and the run loop share
pub struct AppState {
    /// Countdown read-out, written by the run loop
    pub countdown: CountdownState,
    /// Pending action and user settings, written by the control surface
    pub control: ControlState,
    /// Process-wide stop signal
    pub stop: StopSignal,
    /// Camera feed fan-out
    pub frames: MjpegBroadcaster,
    pub camera: Arc<dyn FrameSource>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    pub emoji: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    pub fn new(
        port: u16,
        host: String,
        emoji: String,
        control: ControlState,
        camera: Arc<dyn FrameSource>,
        stop: StopSignal,
    ) -> Self {
        Self {
            countdown: CountdownState::new(),
            control,
            stop,
            frames: MjpegBroadcaster::default(),
            camera,
            start_time: Instant::now(),
            port,
            host,
            emoji,
            last_action: Mutex::new(None),
        }
    }

    /// Post a control action and remember it for `/status`
    pub fn post_action(&self, action: ControlAction) {
        info!("Control action received: {}", action.name());
        self.control.post(action);
        self.record_action(action.name());
    }

    /// Remember the last user-visible action
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some((action.to_string(), Utc::now()));
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, time)) => (Some(action), Some(time)),
            None => (None, None),
        }
    }

    pub fn camera_available(&self) -> bool {
        self.camera.is_live()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Browser URL for the control panel
    pub fn ui_url(&self) -> String {
        if self.host == "0.0.0.0" || self.host == "127.0.0.1" {
            format!("http://127.0.0.1:{}", self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::PlaceholderCamera;

    fn state(host: &str) -> AppState {
        AppState::new(
            5001,
            host.to_string(),
            "🎉".to_string(),
            ControlState::new(String::new(), false),
            Arc::new(PlaceholderCamera::new().unwrap()),
            StopSignal::new(),
        )
    }

    #[test]
    fn test_post_action_is_recorded() {
        let state = state("0.0.0.0");
        assert_eq!(state.get_last_action(), (None, None));

        state.post_action(ControlAction::Stop);
        let (action, time) = state.get_last_action();
        assert_eq!(action.as_deref(), Some("stop"));
        assert!(time.is_some());
        assert_eq!(state.control.pending_action(), Some(ControlAction::Stop));
    }

    #[test]
    fn test_ui_url() {
        assert_eq!(state("0.0.0.0").ui_url(), "http://127.0.0.1:5001");
        assert_eq!(state("reachy.local").ui_url(), "http://reachy.local:5001");
    }

    #[test]
    fn test_uptime_starts_in_seconds() {
        assert!(state("0.0.0.0").get_uptime().ends_with('s'));
        assert!(!state("0.0.0.0").camera_available());
    }
}
