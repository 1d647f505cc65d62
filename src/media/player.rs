//! Local audio playback through the system's command-line players

use std::path::Path;

use tokio::sync::watch;
use tracing::{debug, info};

use super::process::spawn_first;

/// Plays audio files with whatever player the host has installed.
///
/// Every playback races the stop generation: [`LocalPlayer::stop_all`] bumps
/// it and all in-flight players are killed.
#[derive(Debug)]
pub struct LocalPlayer {
    generation: watch::Sender<u64>,
}

impl LocalPlayer {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    fn candidates(path: &Path) -> Vec<(&'static str, Vec<String>)> {
        let file = path.to_string_lossy().to_string();
        if cfg!(target_os = "macos") {
            vec![("afplay", vec![file])]
        } else {
            vec![
                ("paplay", vec![file.clone()]),
                ("aplay", vec!["-q".to_string(), file.clone()]),
                ("mpg123", vec!["-q".to_string(), file.clone()]),
                (
                    "ffplay",
                    vec![
                        "-nodisp".to_string(),
                        "-autoexit".to_string(),
                        "-loglevel".to_string(),
                        "quiet".to_string(),
                        file,
                    ],
                ),
            ]
        }
    }

    /// Receiver that changes on the next `stop_all`. Take it before any
    /// slow preparation so a stop during that time is not missed.
    pub fn stop_receiver(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Play `path` and wait until it finishes or playback is stopped.
    pub async fn play(&self, path: &Path) -> Result<(), String> {
        self.play_until_stopped(path, self.stop_receiver()).await
    }

    /// Play `path` unless `stopped` has seen a `stop_all` already, and wait
    /// until it finishes or the next stop.
    pub async fn play_until_stopped(
        &self,
        path: &Path,
        mut stopped: watch::Receiver<u64>,
    ) -> Result<(), String> {
        if stopped.has_changed().unwrap_or(true) {
            debug!("Playback of {} cancelled before it started", path.display());
            return Ok(());
        }
        let mut child = spawn_first(&Self::candidates(path))?;
        debug!("Playing {}", path.display());

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| format!("Player failed: {}", e))?;
                debug!("Player exited with {}", status);
                Ok(())
            }
            _ = stopped.changed() => {
                if let Err(e) = child.kill().await {
                    debug!("Player already gone: {}", e);
                }
                info!("Playback of {} stopped", path.display());
                Ok(())
            }
        }
    }

    /// Stop every playback currently in flight.
    pub fn stop_all(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }
}

impl Default for LocalPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_all_bumps_generation() {
        let player = LocalPlayer::new();
        let mut stopped = player.stop_receiver();
        assert!(!stopped.has_changed().unwrap());

        player.stop_all();
        player.stop_all();
        assert!(stopped.has_changed().unwrap());
        assert_eq!(*stopped.borrow_and_update(), 2);
    }

    #[tokio::test]
    async fn test_stop_before_playback_starts_cancels_it() {
        let player = LocalPlayer::new();
        let stopped = player.stop_receiver();
        player.stop_all();

        // Returns without spawning a player for the missing file
        let result = player
            .play_until_stopped(Path::new("/nonexistent/song.mp3"), stopped)
            .await;
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_candidates_pass_the_file() {
        let candidates = LocalPlayer::candidates(Path::new("/tmp/song.mp3"));
        assert!(!candidates.is_empty());
        for (_, args) in candidates {
            assert_eq!(args.last().map(String::as_str), Some("/tmp/song.mp3"));
        }
    }
}
