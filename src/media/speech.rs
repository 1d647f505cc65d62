//! Spoken countdown numbers
//!
//! Clips for every number the run loop can announce are rendered once at
//! startup so speaking during the final ten seconds only has to start a
//! player. Numbers without a clip fall back to live text-to-speech.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, warn};

use super::process::{run_quiet, spawn_first};

const RENDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Numbers that get a pre-rendered clip: the final ten plus the 10 s marks.
pub fn announced_numbers() -> Vec<u32> {
    (1..=10).chain((20..=60).step_by(10)).collect()
}

/// Pre-rendered countdown clips.
#[derive(Debug, Default)]
pub struct CountdownVoice {
    clips: HashMap<u32, PathBuf>,
}

impl CountdownVoice {
    /// A voice with no clips; every number goes through live TTS.
    pub fn live_only() -> Self {
        Self::default()
    }

    /// Render a clip for every announced number into `dir`.
    ///
    /// Failures are logged and skipped; the voice is usable with any subset.
    pub async fn prepare(dir: &Path) -> Self {
        info!("Pre-generating countdown audio files...");
        let mut clips = HashMap::new();

        for number in announced_numbers() {
            match render_clip(dir, number).await {
                Ok(path) => {
                    clips.insert(number, path);
                }
                Err(e) => warn!("Failed to generate audio for {}: {}", number, e),
            }
        }

        info!("Generated {} countdown audio files", clips.len());
        Self { clips }
    }

    pub fn clip_for(&self, number: u32) -> Option<&Path> {
        self.clips.get(&number).map(PathBuf::as_path)
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }
}

async fn render_clip(dir: &Path, number: u32) -> Result<PathBuf, String> {
    let text = number.to_string();
    let wav = dir.join(format!("countdown_{}.wav", number));
    let wav_arg = wav.to_string_lossy().to_string();

    if cfg!(target_os = "macos") {
        let aiff = dir.join(format!("countdown_{}.aiff", number));
        let aiff_arg = aiff.to_string_lossy().to_string();
        run_quiet("say", &["-o", &aiff_arg, &text], RENDER_TIMEOUT).await?;
        // 16 kHz mono PCM plays everywhere, including the robot speaker
        run_quiet(
            "afconvert",
            &["-f", "WAVE", "-d", "LEI16@16000", &aiff_arg, &wav_arg],
            RENDER_TIMEOUT,
        )
        .await?;
    } else {
        run_quiet("espeak", &["-w", &wav_arg, &text], RENDER_TIMEOUT).await?;
    }

    if !wav.exists() {
        return Err(format!("{} was not written", wav.display()));
    }
    debug!("Rendered {}", wav.display());
    Ok(wav)
}

/// Speak `number` straight through the system TTS engine.
pub async fn speak_live(number: u32) -> Result<(), String> {
    let text = number.to_string();
    let candidates: Vec<(&str, Vec<String>)> = if cfg!(target_os = "macos") {
        vec![("say", vec![text])]
    } else {
        vec![("espeak", vec![text.clone()]), ("spd-say", vec!["--wait".to_string(), text])]
    };

    let mut child = spawn_first(&candidates)?;
    child
        .wait()
        .await
        .map_err(|e| format!("TTS failed: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announced_numbers_cover_final_ten_and_marks() {
        let numbers = announced_numbers();
        assert_eq!(numbers.len(), 15);
        for n in 1..=10 {
            assert!(numbers.contains(&n));
        }
        for n in [20, 30, 40, 50, 60] {
            assert!(numbers.contains(&n));
        }
        assert!(!numbers.contains(&11));
    }

    #[test]
    fn test_live_only_voice_has_no_clips() {
        let voice = CountdownVoice::live_only();
        assert_eq!(voice.clip_count(), 0);
        assert!(voice.clip_for(3).is_none());
    }
}
