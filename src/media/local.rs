//! Announcer backed by the host's speakers

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{
    music::fetch_track,
    player::LocalPlayer,
    speech::{speak_live, CountdownVoice},
    Announcer,
};

/// Speaks with pre-rendered clips (live TTS as fallback) and plays
/// downloaded music through [`LocalPlayer`].
#[derive(Debug)]
pub struct LocalAnnouncer {
    voice: CountdownVoice,
    player: LocalPlayer,
    cache_dir: PathBuf,
}

impl LocalAnnouncer {
    pub fn new(voice: CountdownVoice, cache_dir: PathBuf) -> Self {
        Self {
            voice,
            player: LocalPlayer::new(),
            cache_dir,
        }
    }
}

#[async_trait]
impl Announcer for LocalAnnouncer {
    async fn speak(&self, number: u32) -> Result<(), String> {
        if let Some(clip) = self.voice.clip_for(number) {
            match self.player.play(clip).await {
                Ok(()) => {
                    debug!("Spoke {}", number);
                    return Ok(());
                }
                Err(e) => warn!("Clip playback failed ({}), using live TTS", e),
            }
        }
        speak_live(number).await
    }

    async fn play_music(&self, url: &str) -> Result<(), String> {
        // A stop that lands during the download cancels this playback too
        let stopped = self.player.stop_receiver();
        let track = fetch_track(url, &self.cache_dir).await?;

        info!("Playing celebration music");
        self.player.play_until_stopped(&track, stopped).await
    }

    async fn stop(&self) {
        self.player.stop_all();
    }
}
