//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, Days, Local, NaiveDateTime, NaiveTime, TimeZone};
use clap::Parser;

use crate::media::{recorder::default_recording_name, DEFAULT_MUSIC_URL};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "reachy-countdown")]
#[command(about = "Countdown and celebration show for the Reachy Mini robot, with a web control panel")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port for the web control panel
    #[arg(short, long, default_value = "5001")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Base URL of the robot daemon
    #[arg(long, default_value = "http://localhost:8000")]
    pub daemon_url: String,

    /// Drive a simulated robot instead of the daemon
    #[arg(long)]
    pub simulate: bool,

    /// Count down to this local time (ISO 8601, or "midnight") right away
    #[arg(long)]
    pub target: Option<String>,

    /// Count down this many seconds from now right away (overrides --target)
    #[arg(long)]
    pub test_seconds: Option<u64>,

    /// Length of the celebration in seconds
    #[arg(long, default_value = "60")]
    pub celebration_seconds: u64,

    /// Exit after the first celebration
    #[arg(long)]
    pub once: bool,

    /// Record the camera feed to a Motion-JPEG file
    #[arg(long)]
    pub record: bool,

    /// Recording file name (defaults to countdown_YYYYMMDD_HHMMSS.mjpeg)
    #[arg(long)]
    pub video_output: Option<PathBuf>,

    /// Celebration music URL
    #[arg(long, default_value = DEFAULT_MUSIC_URL)]
    pub music_url: String,

    /// Emoji shown on the control panel
    #[arg(long, default_value = "🎉")]
    pub emoji: String,

    /// Serve a placeholder frame instead of the robot camera
    #[arg(long)]
    pub no_camera: bool,

    /// JPEG snapshot URL (defaults to <daemon-url>/api/camera/snapshot)
    #[arg(long)]
    pub camera_url: Option<String>,

    /// Speak every 10 second mark during the final minute
    #[arg(long)]
    pub speak_intervals: bool,

    /// Log announcements instead of playing audio
    #[arg(long)]
    pub mute: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn celebration(&self) -> Duration {
        Duration::from_secs(self.celebration_seconds)
    }

    pub fn camera_url(&self) -> String {
        match &self.camera_url {
            Some(url) => url.clone(),
            None => format!("{}/api/camera/snapshot", self.daemon_url.trim_end_matches('/')),
        }
    }

    /// Where `--record` writes, if recording is on
    pub fn recording_path(&self) -> Option<PathBuf> {
        if !self.record {
            return None;
        }
        Some(
            self.video_output
                .clone()
                .unwrap_or_else(|| PathBuf::from(default_recording_name(Local::now()))),
        )
    }

    /// Countdown to arm at startup. `--test-seconds` wins over `--target`.
    pub fn initial_target(&self, now: DateTime<Local>) -> Result<Option<DateTime<Local>>, String> {
        if let Some(seconds) = self.test_seconds {
            let seconds = i64::try_from(seconds).map_err(|_| "--test-seconds is too large".to_string())?;
            return now
                .checked_add_signed(chrono::Duration::seconds(seconds))
                .map(Some)
                .ok_or_else(|| "--test-seconds is too large".to_string());
        }
        match &self.target {
            Some(target) => parse_target(target, now).map(Some),
            None => Ok(None),
        }
    }
}

/// Parse a `--target` value: `midnight` (the next one) or a local ISO 8601
/// date-time, with or without an offset.
pub fn parse_target(value: &str, now: DateTime<Local>) -> Result<DateTime<Local>, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("midnight") {
        return next_midnight(now);
    }
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.with_timezone(&Local));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("Invalid target '{}': expected ISO date-time or 'midnight'", value))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("Target '{}' does not exist in the local time zone", value))
}

fn next_midnight(now: DateTime<Local>) -> Result<DateTime<Local>, String> {
    let tomorrow = now
        .date_naive()
        .checked_add_days(Days::new(1))
        .ok_or_else(|| "Date out of range".to_string())?;
    Local
        .from_local_datetime(&tomorrow.and_time(NaiveTime::MIN))
        .earliest()
        .ok_or_else(|| "Midnight does not exist in the local time zone".to_string())
}
