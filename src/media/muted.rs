//! Silent announcer that only logs and remembers what it was asked to do

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use tracing::info;

use super::Announcer;

#[derive(Debug, Default)]
pub struct MutedAnnouncer {
    spoken: Mutex<Vec<u32>>,
    tracks: Mutex<Vec<String>>,
    stops: AtomicUsize,
}

impl MutedAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every number passed to `speak`, in call order.
    pub fn spoken(&self) -> Vec<u32> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Every URL passed to `play_music`, in call order.
    pub fn tracks(&self) -> Vec<String> {
        self.tracks.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Announcer for MutedAnnouncer {
    async fn speak(&self, number: u32) -> Result<(), String> {
        info!("(muted) {}", number);
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(number);
        }
        Ok(())
    }

    async fn play_music(&self, url: &str) -> Result<(), String> {
        info!("(muted) music: {}", url);
        if let Ok(mut tracks) = self.tracks.lock() {
            tracks.push(url.to_string());
        }
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
