//! Pose sequences for every phase of the countdown
//!
//! Pure data: the run loop decides *when* to perform a sequence, this module
//! decides *what* it looks like.

use std::time::Duration;

use crate::robot::{Antennas, HeadPose, PoseCommand};

/// Head pitch while waiting, in degrees (negative is up).
pub const REST_PITCH: f64 = -30.0;

/// Final-minute interpolation endpoints, at the 60 s and 10 s marks.
const MINUTE_ANTENNA_START: f64 = -0.6;
const MINUTE_ANTENNA_END: f64 = 0.6;
const MINUTE_PITCH_START: f64 = -30.0;
const MINUTE_PITCH_END: f64 = -50.0;

/// One element of a routine.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Move(PoseCommand),
    Pause(Duration),
}

impl Step {
    /// Time the step occupies once submitted.
    pub fn duration(&self) -> Duration {
        match self {
            Step::Move(command) => command.duration,
            Step::Pause(duration) => *duration,
        }
    }
}

fn mv(command: PoseCommand) -> Step {
    Step::Move(command)
}

fn pause(secs: f64) -> Step {
    Step::Pause(Duration::from_secs_f64(secs))
}

/// Gentle sway while more than a minute remains.
pub fn idle_sway() -> Vec<Step> {
    vec![
        mv(PoseCommand::secs(0.3).head(HeadPose::pitched(REST_PITCH))),
        mv(PoseCommand::secs(0.5)
            .head(HeadPose::pitched(REST_PITCH))
            .antennas(Antennas::new(-0.2, 0.2))),
        mv(PoseCommand::secs(0.5).antennas(Antennas::new(0.2, -0.2))),
    ]
}

/// Elapsed fraction of the final minute: 0 at the 60 s mark, 1 at 10 s.
pub fn final_minute_progress(remaining: f64) -> f64 {
    ((60.0 - remaining) / 50.0).clamp(0.0, 1.0)
}

/// Antenna position for the final minute, rising as the end nears.
pub fn final_minute_antenna(remaining: f64) -> f64 {
    let progress = final_minute_progress(remaining);
    MINUTE_ANTENNA_START + progress * (MINUTE_ANTENNA_END - MINUTE_ANTENNA_START)
}

/// Head pitch for the final minute, tilting further up as the end nears.
pub fn final_minute_pitch(remaining: f64) -> f64 {
    let progress = final_minute_progress(remaining);
    MINUTE_PITCH_START + progress * (MINUTE_PITCH_END - MINUTE_PITCH_START)
}

/// Pose refresh for one final-minute tick.
pub fn final_minute_pose(remaining: f64) -> Vec<Step> {
    vec![
        mv(PoseCommand::secs(0.4).antennas(Antennas::both(final_minute_antenna(remaining)))),
        mv(PoseCommand::secs(0.4).head(HeadPose::pitched(final_minute_pitch(remaining)))),
    ]
}

/// The 10 s mark a final-minute countdown has most recently crossed
/// (60, 50, 40, 30 or 20). `None` outside the final minute.
pub fn interval_mark(remaining: f64) -> Option<u32> {
    if remaining > 10.0 && remaining <= 60.0 {
        Some(((remaining / 10.0).ceil() as u32) * 10)
    } else {
        None
    }
}

/// Quick antenna flip played at every 10 s mark, ending where it started.
pub fn flourish(remaining: f64) -> Vec<Step> {
    vec![
        mv(PoseCommand::secs(0.25).antennas(Antennas::new(0.8, -0.8))),
        mv(PoseCommand::secs(0.25).antennas(Antennas::new(-0.8, 0.8))),
        mv(PoseCommand::secs(0.25).antennas(Antennas::both(final_minute_antenna(remaining)))),
    ]
}

/// The number to announce during the final ten seconds (10 down to 1).
pub fn final_ten_number(remaining: f64) -> Option<u32> {
    if remaining > 0.0 && remaining <= 10.0 {
        Some(remaining.ceil() as u32)
    } else {
        None
    }
}

/// Antenna flip for `number`; alternates direction every second.
pub fn final_ten_flip(number: u32) -> PoseCommand {
    let antennas = if number % 2 == 0 {
        Antennas::new(0.7, -0.7)
    } else {
        Antennas::new(-0.7, 0.7)
    };
    PoseCommand::secs(0.2).antennas(antennas)
}

/// Three big spins to open the celebration.
pub fn opening_spins() -> Vec<Step> {
    (0..3)
        .flat_map(|_| {
            [
                mv(PoseCommand::secs(0.4).antennas(Antennas::new(0.6, -0.4))),
                mv(PoseCommand::secs(0.4).head(HeadPose::new(15.0, -35.0, -20.0))),
                mv(PoseCommand::secs(0.4).antennas(Antennas::new(-0.4, 0.6))),
                mv(PoseCommand::secs(0.4).head(HeadPose::new(-15.0, -35.0, 20.0))),
            ]
        })
        .collect()
}

/// Antennas up, head thrown back.
pub fn victory_pose() -> Vec<Step> {
    vec![
        mv(PoseCommand::secs(0.2).antennas(Antennas::both(0.6))),
        mv(PoseCommand::secs(0.3).head(HeadPose::pitched(-45.0))),
        pause(0.5),
    ]
}

/// One beat of the celebration dance. Every fifth beat adds a big move.
pub fn dance_beat(beat: u64) -> Vec<Step> {
    let mut steps = vec![pause(0.1)];

    if beat % 2 == 0 {
        steps.push(mv(PoseCommand::secs(0.4).antennas(Antennas::new(0.5, -0.2))));
        steps.push(mv(PoseCommand::secs(0.4).head(HeadPose::new(10.0, -30.0, -15.0))));
    } else {
        steps.push(mv(PoseCommand::secs(0.4).antennas(Antennas::new(-0.2, 0.5))));
        steps.push(mv(PoseCommand::secs(0.4).head(HeadPose::new(-10.0, -30.0, 15.0))));
    }

    if beat % 5 == 0 {
        steps.push(mv(PoseCommand::secs(0.5).antennas(Antennas::both(0.6))));
        steps.push(mv(PoseCommand::secs(0.5).head(HeadPose::pitched(-40.0))));
        steps.push(pause(0.3));
    }
    steps
}

/// The hidden celebration: five fast spins then three flair poses.
pub fn easter_egg_routine() -> Vec<Step> {
    let spins = (0..5).flat_map(|_| {
        [
            mv(PoseCommand::secs(0.3).antennas(Antennas::new(0.8, -0.6))),
            mv(PoseCommand::secs(0.3).head(HeadPose::new(20.0, -40.0, -30.0))),
            mv(PoseCommand::secs(0.3).antennas(Antennas::new(-0.6, 0.8))),
            mv(PoseCommand::secs(0.3).head(HeadPose::new(-20.0, -40.0, 30.0))),
        ]
    });
    let flair = (0..3).flat_map(|_| {
        [
            mv(PoseCommand::secs(0.2).antennas(Antennas::both(0.7))),
            mv(PoseCommand::secs(0.2).head(HeadPose::new(10.0, -50.0, 0.0))),
            pause(0.2),
            mv(PoseCommand::secs(0.2).antennas(Antennas::both(0.7))),
            mv(PoseCommand::secs(0.2).head(HeadPose::new(-10.0, -50.0, 0.0))),
            pause(0.2),
        ]
    });
    spins.chain(flair).collect()
}

/// Total time a routine takes when every step runs to completion.
pub fn routine_duration(steps: &[Step]) -> Duration {
    steps.iter().map(Step::duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(steps: &[Step]) -> usize {
        steps.iter().filter(|s| matches!(s, Step::Move(_))).count()
    }

    #[test]
    fn test_final_minute_interpolation_endpoints() {
        assert_eq!(final_minute_antenna(60.0), -0.6);
        assert!((final_minute_antenna(10.0) - 0.6).abs() < 1e-9);
        assert!((final_minute_antenna(35.0)).abs() < 1e-9);

        assert_eq!(final_minute_pitch(60.0), -30.0);
        assert_eq!(final_minute_pitch(10.0), -50.0);
        assert_eq!(final_minute_pitch(35.0), -40.0);
    }

    #[test]
    fn test_final_minute_progress_is_clamped() {
        assert_eq!(final_minute_progress(120.0), 0.0);
        assert_eq!(final_minute_progress(0.0), 1.0);
    }

    #[test]
    fn test_interval_marks() {
        assert_eq!(interval_mark(60.0), Some(60));
        assert_eq!(interval_mark(50.3), Some(60));
        assert_eq!(interval_mark(50.0), Some(50));
        assert_eq!(interval_mark(49.9), Some(50));
        assert_eq!(interval_mark(10.5), Some(20));
        assert_eq!(interval_mark(10.0), None);
        assert_eq!(interval_mark(60.5), None);
    }

    #[test]
    fn test_final_ten_numbers() {
        assert_eq!(final_ten_number(10.0), Some(10));
        assert_eq!(final_ten_number(9.95), Some(10));
        assert_eq!(final_ten_number(9.0), Some(9));
        assert_eq!(final_ten_number(0.05), Some(1));
        assert_eq!(final_ten_number(0.0), None);
        assert_eq!(final_ten_number(10.2), None);
    }

    #[test]
    fn test_final_ten_flip_alternates() {
        assert_eq!(final_ten_flip(4).antennas, Some(Antennas::new(0.7, -0.7)));
        assert_eq!(final_ten_flip(3).antennas, Some(Antennas::new(-0.7, 0.7)));
    }

    #[test]
    fn test_dance_beat_big_move_every_fifth() {
        assert_eq!(moves(&dance_beat(1)), 2);
        assert_eq!(moves(&dance_beat(5)), 4);
        assert_eq!(moves(&dance_beat(10)), 4);
        assert_ne!(dance_beat(1), dance_beat(2));
    }

    #[test]
    fn test_routine_sizes() {
        assert_eq!(moves(&opening_spins()), 12);
        assert_eq!(moves(&easter_egg_routine()), 20 + 12);
        let victory = routine_duration(&victory_pose()).as_secs_f64();
        assert!((victory - 1.0).abs() < 1e-6);
    }
}
