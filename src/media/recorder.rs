//! Motion-JPEG recording of the camera feed

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
};
use tracing::info;

/// Default file name for a recording started at `now`.
pub fn default_recording_name(now: DateTime<Local>) -> String {
    format!("countdown_{}.mjpeg", now.format("%Y%m%d_%H%M%S"))
}

/// Appends JPEG frames back to back, which players read as raw MJPEG.
#[derive(Debug)]
pub struct MjpegRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    frames: u64,
}

impl MjpegRecorder {
    pub async fn create(path: &Path) -> Result<Self, String> {
        let file = File::create(path)
            .await
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        info!("Recording video to: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            frames: 0,
        })
    }

    pub async fn write_frame(&mut self, jpeg: &[u8]) -> Result<(), String> {
        self.writer
            .write_all(jpeg)
            .await
            .map_err(|e| format!("Failed to write frame: {}", e))?;
        self.frames += 1;
        Ok(())
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Flush everything to disk.
    pub async fn finish(mut self) -> Result<PathBuf, String> {
        self.writer
            .flush()
            .await
            .map_err(|e| format!("Failed to flush {}: {}", self.path.display(), e))?;
        info!("Video saved to: {} ({} frames)", self.path.display(), self.frames);
        Ok(self.path)
    }
}
