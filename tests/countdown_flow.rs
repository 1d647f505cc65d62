//! Run loop behaviour against the simulated robot and the muted announcer,
//! on tokio's paused clock.

use std::{sync::Arc, time::Duration};

use chrono::Local;
use tokio::{task::JoinHandle, time::sleep};

use reachy_countdown::{
    choreography,
    media::{MutedAnnouncer, PlaceholderCamera},
    robot::{PoseCommand, SimulatedRobot},
    state::{AppState, ControlAction, ControlState, Phase},
    tasks::{CountdownRunner, RunSettings},
    utils::StopSignal,
};

const MUSIC: &str = "https://example.com/auld-lang-syne";

struct Harness {
    state: Arc<AppState>,
    robot: Arc<SimulatedRobot>,
    announcer: Arc<MutedAnnouncer>,
    stop: StopSignal,
    runner: JoinHandle<()>,
}

fn settings() -> RunSettings {
    RunSettings {
        celebration: Duration::from_secs(1),
        ..RunSettings::default()
    }
}

fn harness(settings: RunSettings) -> Harness {
    let stop = StopSignal::new();
    let state = Arc::new(AppState::new(
        5001,
        "127.0.0.1".to_string(),
        "🎉".to_string(),
        ControlState::new(MUSIC.to_string(), false),
        Arc::new(PlaceholderCamera::new().unwrap()),
        stop.clone(),
    ));
    let robot = Arc::new(SimulatedRobot::new());
    let announcer = Arc::new(MutedAnnouncer::new());
    let runner = tokio::spawn(
        CountdownRunner::new(Arc::clone(&state), robot.clone(), announcer.clone(), settings).run(),
    );
    Harness {
        state,
        robot,
        announcer,
        stop,
        runner,
    }
}

impl Harness {
    fn start(&self, seconds: f64) {
        self.state.post_action(ControlAction::Start { seconds });
    }

    fn neutral_poses(&self) -> usize {
        let neutral = PoseCommand::neutral();
        self.robot.history().iter().filter(|command| **command == neutral).count()
    }

    fn flips(&self) -> usize {
        let even = choreography::final_ten_flip(0);
        let odd = choreography::final_ten_flip(1);
        self.robot
            .history()
            .iter()
            .filter(|command| **command == even || **command == odd)
            .count()
    }

    async fn shutdown(self) {
        self.stop.trigger();
        tokio::time::timeout(Duration::from_secs(30), self.runner)
            .await
            .expect("run loop should exit")
            .unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_start_arms_countdown_and_empties_mailbox() {
    let h = harness(settings());
    h.start(120.0);
    sleep(Duration::from_millis(1500)).await;

    let snapshot = h.state.countdown.snapshot();
    assert_eq!(h.state.control.pending_action(), None);
    assert!(h.state.control.is_running());
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.remaining <= 120.0 && snapshot.remaining > 115.0);

    let target = snapshot.target.expect("target set");
    let ahead = (target - Local::now()).num_milliseconds() as f64 / 1000.0;
    assert!((ahead - 120.0).abs() < 2.0, "target {ahead}s ahead");

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_from_every_sub_phase() {
    let h = harness(settings());

    for (seconds, expected) in [(120.0, Phase::Idle), (40.0, Phase::FinalMinute), (8.0, Phase::FinalTen)] {
        h.start(seconds);
        sleep(Duration::from_secs(3)).await;
        assert_eq!(h.state.countdown.snapshot().phase, expected);

        h.state.post_action(ControlAction::Stop);
        sleep(Duration::from_secs(3)).await;
        assert_eq!(h.state.countdown.snapshot().phase, Phase::AwaitingStart);
        assert!(!h.state.control.is_running());
        assert_eq!(h.state.control.pending_action(), None);
        assert_eq!(h.robot.last_command(), Some(PoseCommand::neutral()));
    }

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_final_ten_speaks_and_flips_once_per_second() {
    let h = harness(settings());
    h.start(12.0);
    sleep(Duration::from_secs(25)).await;

    assert_eq!(h.announcer.spoken(), vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1]);
    assert_eq!(h.flips(), 10);
    assert_eq!(h.announcer.tracks(), vec![MUSIC.to_string()]);
    assert_eq!(h.state.countdown.snapshot().phase, Phase::AwaitingStart);
    assert!(!h.state.control.is_running());

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_speak_intervals_announces_marks() {
    let h = harness(settings());
    h.state.control.set_speak_intervals(true);
    h.start(45.0);
    sleep(Duration::from_secs(60)).await;

    // The 50 s mark was already behind a 45 s countdown
    let spoken = h.announcer.spoken();
    assert_eq!(&spoken[..3], &[40, 30, 20]);
    assert_eq!(&spoken[3..], &[10, 9, 8, 7, 6, 5, 4, 3, 2, 1]);

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_remaining_never_increases_while_counting() {
    let h = harness(settings());
    h.start(75.0);
    sleep(Duration::from_secs(2)).await;

    let mut readings = Vec::new();
    for _ in 0..700 {
        sleep(Duration::from_millis(100)).await;
        let snapshot = h.state.countdown.snapshot();
        if snapshot.phase.is_counting() {
            readings.push(snapshot.remaining);
        }
    }

    assert!(readings.len() > 100);
    assert!(readings.windows(2).all(|pair| pair[1] <= pair[0]));

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_easter_egg_consumed_by_next_celebration_only() {
    let h = harness(settings());
    h.state.control.trigger_easter_egg();
    h.start(2.0);
    sleep(Duration::from_secs(20)).await;

    assert!(!h.state.control.easter_egg_armed());
    assert!(h.announcer.tracks().is_empty());

    h.start(1.0);
    sleep(Duration::from_secs(15)).await;
    assert_eq!(h.announcer.tracks().len(), 1);

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_negative_start_celebrates_without_final_ten() {
    let h = harness(settings());
    h.start(-5.0);
    sleep(Duration::from_secs(15)).await;

    assert!(h.announcer.spoken().is_empty());
    assert_eq!(h.flips(), 0);
    assert_eq!(h.announcer.tracks().len(), 1);

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reset_zeroes_readout() {
    let h = harness(settings());
    h.start(120.0);
    sleep(Duration::from_secs(3)).await;

    h.state.post_action(ControlAction::Reset);
    sleep(Duration::from_secs(3)).await;

    let snapshot = h.state.countdown.snapshot();
    assert_eq!(snapshot.remaining, 0.0);
    assert_eq!(snapshot.formatted(), "00:00:00");
    assert_eq!(snapshot.target, None);
    assert_eq!(snapshot.phase, Phase::AwaitingStart);
    assert!(!h.state.control.is_running());

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_start_while_counting_rearms() {
    let h = harness(settings());
    h.start(120.0);
    sleep(Duration::from_secs(3)).await;

    h.start(30.0);
    sleep(Duration::from_secs(3)).await;

    let snapshot = h.state.countdown.snapshot();
    assert_eq!(snapshot.phase, Phase::FinalMinute);
    assert!(snapshot.remaining <= 30.0);
    assert!(h.state.control.is_running());

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_robot_still_completes_once_run() {
    let h = harness(RunSettings {
        once: true,
        ..settings()
    });
    h.robot.set_failing(true);
    h.start(3.0);

    tokio::time::timeout(Duration::from_secs(60), h.runner)
        .await
        .expect("run-once loop should exit after the celebration")
        .unwrap();

    assert_eq!(h.announcer.spoken(), vec![3, 2, 1]);
    assert!(h.robot.failure_count() > 0);
    assert_eq!(h.robot.failure_count(), h.robot.command_count());
}

#[tokio::test(start_paused = true)]
async fn test_stop_signal_exits_with_neutral_pose() {
    let h = harness(settings());
    h.start(120.0);
    sleep(Duration::from_secs(2)).await;

    let robot = h.robot.clone();
    let state = Arc::clone(&h.state);
    let announcer = h.announcer.clone();
    h.shutdown().await;

    assert_eq!(robot.last_command(), Some(PoseCommand::neutral()));
    assert!(!state.control.is_running());
    assert!(announcer.stop_count() >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_initial_target_arms_without_ui() {
    let h = harness(RunSettings {
        initial_target: Some(Local::now() + chrono::Duration::seconds(90)),
        ..settings()
    });
    sleep(Duration::from_secs(3)).await;

    assert!(h.state.control.is_running());
    assert_eq!(h.state.countdown.snapshot().phase, Phase::Idle);

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_far_initial_target_is_kept_as_given() {
    let wanted = Local::now() + chrono::Duration::days(800);
    let h = harness(RunSettings {
        initial_target: Some(wanted),
        ..settings()
    });
    sleep(Duration::from_secs(3)).await;

    let snapshot = h.state.countdown.snapshot();
    assert_eq!(snapshot.target, Some(wanted));
    assert_eq!(snapshot.phase, Phase::Idle);
    let days = snapshot.remaining / 86_400.0;
    assert!((days - 800.0).abs() < 0.01, "{days} days remaining");

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_reset_while_awaiting_start_zeroes_readout() {
    let h = harness(settings());
    h.start(120.0);
    sleep(Duration::from_secs(3)).await;
    h.state.post_action(ControlAction::Stop);
    sleep(Duration::from_secs(3)).await;

    // Stop leaves the last read-out on screen
    let stopped = h.state.countdown.snapshot();
    assert_eq!(stopped.phase, Phase::AwaitingStart);
    assert!(stopped.remaining > 100.0);
    assert!(stopped.target.is_some());
    let neutral_before = h.neutral_poses();

    h.state.post_action(ControlAction::Reset);
    sleep(Duration::from_secs(2)).await;

    let snapshot = h.state.countdown.snapshot();
    assert_eq!(snapshot.remaining, 0.0);
    assert_eq!(snapshot.target, None);
    assert_eq!(snapshot.phase, Phase::AwaitingStart);
    assert!(!h.state.control.is_running());
    assert_eq!(h.state.control.pending_action(), None);
    assert_eq!(h.neutral_poses(), neutral_before + 1);
    assert_eq!(h.robot.last_command(), Some(PoseCommand::neutral()));

    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_action_during_celebration_ends_it() {
    let h = harness(RunSettings {
        celebration: Duration::from_secs(120),
        ..settings()
    });
    h.start(1.0);
    sleep(Duration::from_secs(10)).await;
    assert_eq!(h.state.countdown.snapshot().phase, Phase::Celebrating);
    assert!(h.state.control.is_running());

    h.state.post_action(ControlAction::Stop);
    sleep(Duration::from_secs(3)).await;

    assert_eq!(h.state.countdown.snapshot().phase, Phase::AwaitingStart);
    assert!(!h.state.control.is_running());
    // The waiting loop consumed the stop that ended the celebration
    assert_eq!(h.state.control.pending_action(), None);
    assert!(h.announcer.stop_count() >= 2);
    assert_eq!(h.robot.last_command(), Some(PoseCommand::neutral()));

    // No more dancing
    let moves = h.robot.command_count();
    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.robot.command_count(), moves);

    h.shutdown().await;
}
