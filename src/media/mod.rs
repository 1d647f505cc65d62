//! Audio and camera module
//!
//! Everything the countdown plays or films: spoken numbers and celebration
//! music behind the [`Announcer`] trait, camera frames behind
//! [`FrameSource`], and the MJPEG plumbing that serves and records them.

pub mod camera;
pub mod local;
pub mod mjpeg;
pub mod music;
pub mod muted;
pub mod player;
pub mod process;
pub mod recorder;
pub mod speech;

use async_trait::async_trait;

pub use camera::{FrameSource, PlaceholderCamera, SnapshotCamera};
pub use local::LocalAnnouncer;
pub use mjpeg::MjpegBroadcaster;
pub use music::DEFAULT_MUSIC_URL;
pub use muted::MutedAnnouncer;
pub use recorder::MjpegRecorder;
pub use speech::CountdownVoice;

/// Audio side effects of the countdown. Failures are reported, never fatal.
#[async_trait]
pub trait Announcer: Send + Sync {
    /// Say a countdown number.
    async fn speak(&self, number: u32) -> Result<(), String>;

    /// Play the track at `url` until it ends or [`Announcer::stop`] is called.
    async fn play_music(&self, url: &str) -> Result<(), String>;

    /// Best-effort stop of everything currently playing.
    async fn stop(&self);
}
