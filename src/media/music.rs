//! Celebration music download

use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

use super::process::run_capture;

/// Classic "Auld Lang Syne", used when no other track is configured.
pub const DEFAULT_MUSIC_URL: &str = "https://www.youtube.com/watch?v=Al7ONqrdscY&t=3s";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Accept only absolute http(s) URLs as music sources.
pub fn is_valid_music_url(url: &str) -> bool {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.contains(char::is_whitespace))
}

/// Download the audio track behind `url` as mp3 into `dir` with `yt-dlp`.
///
/// Returns the path of the extracted file.
pub async fn fetch_track(url: &str, dir: &Path) -> Result<PathBuf, String> {
    info!("Fetching celebration music from {}", url);
    let template = dir
        .join("countdown_music_%(id)s.%(ext)s")
        .to_string_lossy()
        .to_string();

    let stdout = run_capture(
        "yt-dlp",
        &[
            "--quiet",
            "--no-warnings",
            "--no-playlist",
            "-f",
            "bestaudio/best",
            "-x",
            "--audio-format",
            "mp3",
            "--audio-quality",
            "192K",
            "-o",
            &template,
            "--print",
            "after_move:filepath",
            url,
        ],
        DOWNLOAD_TIMEOUT,
    )
    .await?;

    let path = stdout
        .lines()
        .last()
        .map(PathBuf::from)
        .ok_or_else(|| "yt-dlp did not report an output file".to_string())?;

    if !path.exists() {
        return Err(format!("Audio file not found after download: {}", path.display()));
    }
    debug!("Music downloaded to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_music_urls() {
        assert!(is_valid_music_url(DEFAULT_MUSIC_URL));
        assert!(is_valid_music_url("http://example.com/song.mp3"));
        assert!(is_valid_music_url("  https://youtu.be/abc  "));
    }

    #[test]
    fn test_invalid_music_urls() {
        assert!(!is_valid_music_url(""));
        assert!(!is_valid_music_url("https://"));
        assert!(!is_valid_music_url("ftp://example.com/song.mp3"));
        assert!(!is_valid_music_url("not a url"));
        assert!(!is_valid_music_url("https://exa mple.com"));
    }
}
