//! Camera capture background task

use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{media::MjpegRecorder, state::AppState};

/// ~30 fps for a live camera
const LIVE_FRAME_PERIOD: Duration = Duration::from_millis(33);
/// The placeholder never changes, once a second is plenty
const PLACEHOLDER_FRAME_PERIOD: Duration = Duration::from_secs(1);

/// Background task that pulls frames from the camera, fans them out to the
/// `/video_feed` viewers and optionally records them.
pub async fn frame_capture_task(state: Arc<AppState>, mut recorder: Option<MjpegRecorder>) {
    info!("Starting frame capture task");

    let period = if state.camera.is_live() {
        LIVE_FRAME_PERIOD
    } else {
        PLACEHOLDER_FRAME_PERIOD
    };
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut consecutive_errors: u32 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = state.stop.wait() => break,
        }

        // Nobody watching and nothing to record
        if recorder.is_none() && state.frames.subscriber_count() == 0 {
            continue;
        }

        match state.camera.grab().await {
            Ok(Some(jpeg)) => {
                consecutive_errors = 0;
                if let Some(active) = recorder.as_mut() {
                    if let Err(e) = active.write_frame(&jpeg).await {
                        warn!("Recording stopped: {}", e);
                        recorder = None;
                    }
                }
                state.frames.publish(jpeg);
            }
            Ok(None) => {}
            Err(e) => {
                consecutive_errors += 1;
                if consecutive_errors == 1 {
                    warn!("Camera frame error: {}", e);
                } else {
                    debug!("Camera frame error ({} in a row): {}", consecutive_errors, e);
                }
                if !state.stop.sleep(Duration::from_millis(100)).await {
                    break;
                }
            }
        }
    }

    if let Some(recorder) = recorder {
        if let Err(e) = recorder.finish().await {
            warn!("Failed to finalize recording: {}", e);
        }
    }
    info!("Frame capture task stopped");
}
