//! Countdown run loop
//!
//! One task owns the robot for the whole process. It waits for a start
//! command, counts down while animating the robot, celebrates at zero and
//! goes back to waiting. Control actions arrive through the single-slot
//! mailbox in [`ControlState`](crate::state::ControlState) and are taken
//! (read and cleared) in the same step they are acted on.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Local};
use tokio::{task::JoinSet, time::Instant};
use tracing::{debug, info, warn};

use super::performer::Performer;
use crate::{
    choreography::{self, Step},
    media::{Announcer, DEFAULT_MUSIC_URL},
    robot::{PoseCommand, PoseSink},
    state::{AppState, ControlAction, Phase, MAX_START_SECONDS},
};

/// Mailbox poll period while waiting for a start command.
const AWAIT_POLL: Duration = Duration::from_millis(500);
/// Tick periods per phase.
const IDLE_TICK: Duration = Duration::from_secs(5);
const FINAL_MINUTE_TICK: Duration = Duration::from_secs(1);
const FINAL_TEN_TICK: Duration = Duration::from_millis(100);
/// How long shutdown waits for speech and music tasks before aborting them.
const BACKGROUND_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Run loop configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Length of the standard celebration
    pub celebration: Duration,
    /// Exit after the first celebration
    pub once: bool,
    /// Countdown armed at startup instead of waiting for the UI
    pub initial_target: Option<DateTime<Local>>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            celebration: Duration::from_secs(60),
            once: false,
            initial_target: None,
        }
    }
}

/// An armed countdown.
#[derive(Debug, Clone, Copy)]
struct Armed {
    /// Monotonic deadline; the only clock `remaining` is computed from
    deadline: Instant,
}

enum Outcome {
    /// Reached zero
    Elapsed,
    /// Stopped or reset from the control surface
    Cancelled,
    /// Global stop signal
    Shutdown,
}

/// Signed seconds from `now` until `deadline`; negative once it has passed.
pub fn seconds_until(deadline: Instant, now: Instant) -> f64 {
    if deadline >= now {
        (deadline - now).as_secs_f64()
    } else {
        -(now - deadline).as_secs_f64()
    }
}

pub struct CountdownRunner {
    state: Arc<AppState>,
    announcer: Arc<dyn Announcer>,
    performer: Performer,
    settings: RunSettings,
    /// Last number announced during the final ten seconds
    last_spoken: Option<u32>,
    /// Last 10 s mark celebrated during the final minute
    last_mark: Option<u32>,
    background: JoinSet<()>,
}

impl CountdownRunner {
    pub fn new(
        state: Arc<AppState>,
        robot: Arc<dyn PoseSink>,
        announcer: Arc<dyn Announcer>,
        settings: RunSettings,
    ) -> Self {
        let performer = Performer::new(robot, state.stop.clone());
        Self {
            state,
            announcer,
            performer,
            settings,
            last_spoken: None,
            last_mark: None,
            background: JoinSet::new(),
        }
    }

    /// Run until the stop signal is set, or until the first celebration
    /// ends in run-once mode.
    pub async fn run(mut self) {
        info!("Starting countdown run loop");
        self.announcer.stop().await;
        self.performer
            .perform(&[Step::Move(PoseCommand::neutral()), Step::Pause(Duration::from_secs(1))])
            .await;

        let initial_target = self.settings.initial_target;
        let mut armed = initial_target.and_then(|target| self.arm_at(target));

        loop {
            let current = match armed.take() {
                Some(current) => current,
                None => match self.await_start().await {
                    Some(current) => current,
                    None => break,
                },
            };

            match self.count_down(current).await {
                Outcome::Shutdown => break,
                Outcome::Cancelled => continue,
                Outcome::Elapsed => {
                    self.celebrate().await;
                    self.state.control.set_running(false);
                    if self.settings.once {
                        info!("Run-once mode: exiting after the celebration");
                        break;
                    }
                    if self.state.stop.is_set() {
                        break;
                    }
                    self.performer.perform(&[Step::Move(PoseCommand::neutral())]).await;
                }
            }
        }

        self.shutdown().await;
    }

    /// Sleep one tick; wakes early when an action is posted.
    /// Returns `false` if the stop signal is set.
    async fn wait(&self, duration: Duration) -> bool {
        self.state
            .stop
            .sleep_or(duration, self.state.control.action_posted())
            .await
    }

    /// Arm a countdown of `seconds` from now. Negative values arm one that
    /// has already elapsed.
    fn arm(&mut self, seconds: f64) -> Option<Armed> {
        let seconds = if seconds.is_finite() {
            seconds.clamp(-MAX_START_SECONDS, MAX_START_SECONDS)
        } else {
            0.0
        };
        let target = Local::now() + chrono::Duration::milliseconds((seconds * 1000.0) as i64);
        self.arm_until(target, seconds)
    }

    /// Arm a countdown toward a wall-clock instant. The target is kept as
    /// given, however far away it is.
    fn arm_at(&mut self, target: DateTime<Local>) -> Option<Armed> {
        info!("Countdown to: {}", target);
        let seconds = (target - Local::now()).num_milliseconds() as f64 / 1000.0;
        self.arm_until(target, seconds)
    }

    /// Arm toward `target`, `seconds` away. `None` if the monotonic clock
    /// cannot represent the deadline.
    fn arm_until(&mut self, target: DateTime<Local>, seconds: f64) -> Option<Armed> {
        let now = Instant::now();
        let deadline = match Duration::try_from_secs_f64(seconds.abs()) {
            Ok(offset) if seconds >= 0.0 => now.checked_add(offset),
            Ok(offset) => Some(now.checked_sub(offset).unwrap_or(now)),
            Err(_) => None,
        };
        let Some(deadline) = deadline else {
            warn!("Countdown target {} is out of range, ignoring it", target);
            return None;
        };

        self.last_spoken = None;
        // A mark above the starting point has already passed
        self.last_mark = choreography::interval_mark(seconds).filter(|&mark| f64::from(mark) > seconds);
        self.state.control.set_running(true);
        self.state.countdown.arm(target, seconds);
        info!("Starting {} second countdown (target {})", seconds, target.format("%Y-%m-%d %H:%M:%S"));

        Some(Armed { deadline })
    }

    async fn await_start(&mut self) -> Option<Armed> {
        self.state.countdown.set_phase(Phase::AwaitingStart);
        info!("Waiting for start command");

        loop {
            if self.state.stop.is_set() {
                return None;
            }
            match self.state.control.take_action() {
                Some(ControlAction::Start { seconds }) => {
                    if let Some(armed) = self.arm(seconds) {
                        return Some(armed);
                    }
                }
                Some(ControlAction::Reset) => self.reset().await,
                Some(ControlAction::Stop) => {
                    debug!("Stop received while idle");
                    self.state.control.set_running(false);
                }
                None => {}
            }
            if !self.wait(AWAIT_POLL).await {
                return None;
            }
        }
    }

    /// Stop the countdown, keep the last read-out on screen.
    async fn cancel(&mut self) {
        self.state.control.set_running(false);
        self.state.countdown.set_phase(Phase::AwaitingStart);
        self.performer.perform(&[Step::Move(PoseCommand::neutral())]).await;
    }

    /// Stop the countdown and zero the read-out.
    async fn reset(&mut self) {
        self.state.control.set_running(false);
        self.state.countdown.clear();
        self.performer.perform(&[Step::Move(PoseCommand::neutral())]).await;
    }

    async fn count_down(&mut self, mut armed: Armed) -> Outcome {
        loop {
            if self.state.stop.is_set() {
                return Outcome::Shutdown;
            }
            // Reap finished speech and flip tasks
            while self.background.try_join_next().is_some() {}

            match self.state.control.take_action() {
                Some(ControlAction::Stop) => {
                    info!("Countdown stopped");
                    self.cancel().await;
                    return Outcome::Cancelled;
                }
                Some(ControlAction::Reset) => {
                    info!("Countdown reset");
                    self.reset().await;
                    return Outcome::Cancelled;
                }
                Some(ControlAction::Start { seconds }) => {
                    if let Some(rearmed) = self.arm(seconds) {
                        armed = rearmed;
                    }
                }
                None => {}
            }

            let tick_start = Instant::now();
            let remaining = seconds_until(armed.deadline, tick_start);
            let phase = Phase::classify(remaining);
            self.state.countdown.publish(remaining, phase);

            let period = match phase {
                // classify never yields AwaitingStart
                Phase::Celebrating | Phase::AwaitingStart => return Outcome::Elapsed,
                Phase::FinalTen => {
                    self.final_ten(remaining);
                    FINAL_TEN_TICK
                }
                Phase::FinalMinute => {
                    self.final_minute(remaining).await;
                    FINAL_MINUTE_TICK
                }
                Phase::Idle => {
                    self.performer.perform(&choreography::idle_sway()).await;
                    // Never sleep past the start of the final minute
                    IDLE_TICK.min(Duration::from_secs_f64(remaining - 60.0))
                }
            };

            let pause = period.saturating_sub(tick_start.elapsed());
            if !self.wait(pause).await {
                return Outcome::Shutdown;
            }
        }
    }

    async fn final_minute(&mut self, remaining: f64) {
        debug!("{:.0}s...", remaining.ceil());
        self.performer
            .perform(&choreography::final_minute_pose(remaining))
            .await;

        let Some(mark) = choreography::interval_mark(remaining) else {
            return;
        };
        if self.last_mark == Some(mark) {
            return;
        }
        self.last_mark = Some(mark);
        info!("{}s to go", mark);

        self.performer.perform(&choreography::flourish(remaining)).await;
        if self.state.control.speak_intervals() {
            self.speak_in_background(mark);
        }
    }

    /// Announce and flip once per integer second. Both side effects run in
    /// the background so the 100 ms tick keeps its pace.
    fn final_ten(&mut self, remaining: f64) {
        let Some(number) = choreography::final_ten_number(remaining) else {
            return;
        };
        if self.last_spoken == Some(number) {
            return;
        }
        self.last_spoken = Some(number);
        info!("{}...", number);

        self.speak_in_background(number);
        let performer = self.performer.clone();
        self.background.spawn(async move {
            performer.submit(&choreography::final_ten_flip(number)).await;
        });
    }

    fn speak_in_background(&mut self, number: u32) {
        let announcer = Arc::clone(&self.announcer);
        self.background.spawn(async move {
            if let Err(e) = announcer.speak(number).await {
                warn!("Could not speak {}: {}", number, e);
            }
        });
    }

    /// A control action waiting in the mailbox ends the celebration early.
    /// The action itself is left for the waiting loop to consume.
    fn celebration_interrupted(&self) -> bool {
        self.state.stop.is_set() || self.state.control.pending_action().is_some()
    }

    /// Perform `steps` unless interrupted. Returns `false` if cut short.
    async fn dance(&self, steps: &[Step]) -> bool {
        for step in steps {
            if self.celebration_interrupted() || !self.performer.step(step).await {
                return false;
            }
        }
        true
    }

    async fn celebrate(&mut self) {
        self.state.countdown.set_phase(Phase::Celebrating);

        if self.state.control.take_easter_egg() {
            info!("Easter egg activated! Special celebration mode");
            if self.dance(&choreography::easter_egg_routine()).await {
                info!("Easter egg celebration complete");
            }
        } else {
            info!("Happy New Year! Celebrating for {:?}", self.settings.celebration);
            self.start_music();
            if self.standard_celebration().await {
                info!("Celebration complete");
            } else {
                info!("Celebration interrupted");
            }
        }

        self.announcer.stop().await;
    }

    fn start_music(&mut self) {
        let url = self.state.control.music_url();
        let url = if url.is_empty() {
            DEFAULT_MUSIC_URL.to_string()
        } else {
            url
        };
        let announcer = Arc::clone(&self.announcer);
        self.background.spawn(async move {
            if let Err(e) = announcer.play_music(&url).await {
                warn!("Could not play celebration music: {}", e);
            }
        });
    }

    async fn standard_celebration(&self) -> bool {
        let started = Instant::now();
        if !self.dance(&choreography::opening_spins()).await {
            return false;
        }
        if !self.dance(&choreography::victory_pose()).await {
            return false;
        }

        let mut beat = 0;
        while started.elapsed() < self.settings.celebration {
            beat += 1;
            if !self.dance(&choreography::dance_beat(beat)).await {
                return false;
            }
        }
        true
    }

    async fn shutdown(&mut self) {
        info!("Run loop stopping");
        self.announcer.stop().await;
        self.state.control.set_running(false);
        self.performer.submit(&PoseCommand::neutral()).await;

        let background = &mut self.background;
        let drained = tokio::time::timeout(BACKGROUND_JOIN_TIMEOUT, async {
            while background.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("Background audio tasks still running, aborting them");
            self.background.abort_all();
        }
        info!("Run loop stopped");
    }
}
