//! Countdown state published by the run loop

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Where the run loop is in the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingStart,
    /// More than a minute to go
    Idle,
    /// 10 < remaining <= 60
    FinalMinute,
    /// 0 < remaining <= 10
    FinalTen,
    Celebrating,
}

impl Phase {
    /// Phase for a countdown with `remaining` seconds left.
    pub fn classify(remaining: f64) -> Self {
        if remaining > 60.0 {
            Phase::Idle
        } else if remaining > 10.0 {
            Phase::FinalMinute
        } else if remaining > 0.0 {
            Phase::FinalTen
        } else {
            Phase::Celebrating
        }
    }

    pub fn is_counting(&self) -> bool {
        matches!(self, Phase::Idle | Phase::FinalMinute | Phase::FinalTen)
    }
}

/// What the web layer sees of the countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    /// Seconds until `target` at the last tick; negative once it has passed
    pub remaining: f64,
    /// Wall-clock instant the countdown is racing toward
    pub target: Option<DateTime<Local>>,
    pub phase: Phase,
}

impl CountdownSnapshot {
    pub fn new() -> Self {
        Self {
            remaining: 0.0,
            target: None,
            phase: Phase::AwaitingStart,
        }
    }

    /// `HH:MM:SS` rendering of `remaining`, clamped at zero.
    pub fn formatted(&self) -> String {
        format_hms(self.remaining)
    }
}

impl Default for CountdownSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Format seconds as `HH:MM:SS`. Negative and non-finite values show as zero.
pub fn format_hms(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Countdown record. Written only by the run loop.
#[derive(Debug)]
pub struct CountdownState {
    tx: watch::Sender<CountdownSnapshot>,
}

impl CountdownState {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(CountdownSnapshot::new());
        Self { tx }
    }

    pub fn snapshot(&self) -> CountdownSnapshot {
        self.tx.borrow().clone()
    }

    /// A new countdown toward `target` with `remaining` seconds left.
    pub fn arm(&self, target: DateTime<Local>, remaining: f64) {
        self.tx.send_replace(CountdownSnapshot {
            remaining,
            target: Some(target),
            phase: Phase::classify(remaining),
        });
    }

    /// Tick update for the armed countdown.
    pub fn publish(&self, remaining: f64, phase: Phase) {
        self.tx.send_modify(|snapshot| {
            snapshot.remaining = remaining;
            snapshot.phase = phase;
        });
    }

    pub fn set_phase(&self, phase: Phase) {
        self.tx.send_if_modified(|snapshot| {
            let changed = snapshot.phase != phase;
            snapshot.phase = phase;
            changed
        });
    }

    /// Back to the idle read-out: nothing armed, zero remaining.
    pub fn clear(&self) {
        self.tx.send_replace(CountdownSnapshot::new());
    }
}

impl Default for CountdownState {
    fn default() -> Self {
        Self::new()
    }
}
