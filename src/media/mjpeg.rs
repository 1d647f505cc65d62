//! MJPEG streaming of the camera feed
//!
//! The capture task publishes every frame once; each `/video_feed` client
//! holds a subscriber and receives frames as `multipart/x-mixed-replace`
//! parts. Slow clients skip frames instead of buffering them.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::utils::StopSignal;

/// Must be unique enough to not appear in JPEG data.
pub const MJPEG_BOUNDARY: &str = "frame";

/// Fans frames out to every connected viewer.
#[derive(Debug)]
pub struct MjpegBroadcaster {
    tx: broadcast::Sender<Bytes>,
}

impl MjpegBroadcaster {
    /// Capacity is how many frames a slow viewer may lag before skipping.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish a frame. Returns the number of viewers that will receive it.
    pub fn publish(&self, jpeg: Bytes) -> usize {
        self.tx.send(jpeg).unwrap_or(0)
    }

    pub fn subscribe(&self) -> MjpegSubscriber {
        MjpegSubscriber {
            rx: self.tx.subscribe(),
        }
    }

    /// Receiver of bare JPEG frames, without the multipart envelope.
    #[cfg(test)]
    pub(crate) fn subscribe_raw(&self) -> broadcast::Receiver<Bytes> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for MjpegBroadcaster {
    fn default() -> Self {
        Self::new(4)
    }
}

/// One viewer's end of the stream.
pub struct MjpegSubscriber {
    rx: broadcast::Receiver<Bytes>,
}

/// Wrap a JPEG in its multipart envelope.
pub fn frame_part(jpeg: &[u8]) -> Bytes {
    let head = format!(
        "--{boundary}\r\nContent-Type: image/jpeg\r\nContent-Length: {len}\r\n\r\n",
        boundary = MJPEG_BOUNDARY,
        len = jpeg.len()
    );
    let mut part = Vec::with_capacity(head.len() + jpeg.len() + 2);
    part.extend_from_slice(head.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    Bytes::from(part)
}

impl MjpegSubscriber {
    /// Stream frames until the client disconnects or `stop` is set.
    pub fn into_response(self, stop: StopSignal) -> Response {
        // Lagged receivers just skip to the next frame
        let frames = tokio_stream::StreamExt::filter_map(BroadcastStream::new(self.rx), |result| {
            result
                .ok()
                .map(|jpeg| Ok::<_, std::convert::Infallible>(frame_part(&jpeg)))
        });
        let frames = futures::StreamExt::take_until(frames, async move { stop.wait().await });

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/x-mixed-replace; boundary={MJPEG_BOUNDARY}"),
            )
            .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
            .header(header::PRAGMA, "no-cache")
            .body(Body::from_stream(frames));

        match response {
            Ok(response) => response,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
