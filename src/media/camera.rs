//! Camera frame sources

use async_trait::async_trait;
use bytes::Bytes;
use image::{GrayImage, ImageBuffer};
use std::time::Duration;
use tracing::debug;

/// Placeholder frame size, matching the robot camera's default stream.
const PLACEHOLDER_WIDTH: u32 = 640;
const PLACEHOLDER_HEIGHT: u32 = 480;

/// Something that hands out JPEG frames.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Grab the latest frame, `None` if the camera has nothing yet.
    async fn grab(&self) -> Result<Option<Bytes>, String>;

    /// `false` for sources that only ever serve a stand-in image.
    fn is_live(&self) -> bool {
        true
    }
}

/// Camera exposed as an HTTP endpoint returning one JPEG per request.
#[derive(Debug, Clone)]
pub struct SnapshotCamera {
    url: String,
    http: reqwest::Client,
}

impl SnapshotCamera {
    pub fn new(url: &str) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| format!("Failed to build camera client: {}", e))?;
        Ok(Self {
            url: url.to_string(),
            http,
        })
    }
}

#[async_trait]
impl FrameSource for SnapshotCamera {
    async fn grab(&self) -> Result<Option<Bytes>, String> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| format!("Camera request failed: {}", e))?;

        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(format!("Camera returned status {}", response.status()));
        }

        let jpeg = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read camera frame: {}", e))?;
        if !is_jpeg(&jpeg) {
            debug!("Camera answered with {} non-JPEG bytes", jpeg.len());
            return Ok(None);
        }
        Ok(Some(jpeg))
    }
}

/// Stand-in image served when no camera is available (headless simulation).
#[derive(Debug, Clone)]
pub struct PlaceholderCamera {
    frame: Bytes,
}

impl PlaceholderCamera {
    pub fn new() -> Result<Self, String> {
        let frame = placeholder_frame(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, 85)
            .ok_or_else(|| "Failed to encode placeholder frame".to_string())?;
        Ok(Self { frame })
    }
}

#[async_trait]
impl FrameSource for PlaceholderCamera {
    async fn grab(&self) -> Result<Option<Bytes>, String> {
        Ok(Some(self.frame.clone()))
    }

    fn is_live(&self) -> bool {
        false
    }
}

/// Dark frame with a lighter band across the middle.
pub fn placeholder_frame(width: u32, height: u32, quality: u8) -> Option<Bytes> {
    let band = height / 3..height * 2 / 3;
    let img: GrayImage = ImageBuffer::from_fn(width, height, |_, y| {
        if band.contains(&y) {
            image::Luma([64u8])
        } else {
            image::Luma([16u8])
        }
    });
    encode_gray_jpeg(&img, quality)
}

/// Encode a grayscale image as JPEG.
pub fn encode_gray_jpeg(img: &GrayImage, quality: u8) -> Option<Bytes> {
    let mut jpeg_bytes = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, quality);
    encoder.encode_image(img).ok()?;
    Some(Bytes::from(jpeg_bytes))
}

/// JPEG SOI marker check.
pub fn is_jpeg(data: &[u8]) -> bool {
    data.len() > 2 && data[0] == 0xFF && data[1] == 0xD8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_frame_is_jpeg() {
        let frame = placeholder_frame(64, 48, 80).unwrap();
        assert!(is_jpeg(&frame));
    }

    #[tokio::test]
    async fn test_placeholder_camera_always_has_a_frame() {
        let camera = PlaceholderCamera::new().unwrap();
        assert!(!camera.is_live());
        let first = camera.grab().await.unwrap().unwrap();
        let second = camera.grab().await.unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_is_jpeg_rejects_other_data() {
        assert!(!is_jpeg(b""));
        assert!(!is_jpeg(b"\x89PNG"));
        assert!(is_jpeg(&[0xFF, 0xD8, 0xFF, 0xE0]));
    }
}
