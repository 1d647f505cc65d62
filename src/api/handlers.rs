//! HTTP endpoint handlers
//!
//! Handlers only post actions and change settings. Everything that moves the
//! robot or touches the countdown read-out happens on the run loop.

use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{info, warn};

use crate::{
    media::music::is_valid_music_url,
    state::{AppState, ControlAction, DEFAULT_START_SECONDS, MAX_START_SECONDS},
};
use super::{
    page::render_page,
    responses::{ApiResponse, CountdownResponse, ErrorResponse, HealthResponse, StatusResponse},
};

/// Secrets accepted by `/easter-egg/:secret`, compared case-insensitively
const EASTER_EGG_SECRETS: [&str; 4] = ["konami", "1337", "secret", "easter"];

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

/// Parse an optional JSON body; an empty body yields the default.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| bad_request(format!("Invalid JSON body: {}", e)))
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    pub seconds: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MusicRequest {
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpeakIntervalsRequest {
    pub enabled: Option<bool>,
}

/// Handle GET / - Control panel
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let controls = state.control.snapshot();
    Html(render_page(
        &state.emoji,
        &controls.music_url,
        controls.speak_intervals,
        state.camera_available(),
    ))
}

/// Handle GET /countdown - Current read-out
pub async fn countdown_handler(State(state): State<Arc<AppState>>) -> Json<CountdownResponse> {
    let snapshot = state.countdown.snapshot();
    Json(CountdownResponse::new(&snapshot, state.control.is_running()))
}

/// Handle POST /control/start - Arm a countdown of `seconds` (default 30)
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let request: StartRequest = parse_body(&body)?;
    let seconds = request.seconds.unwrap_or(DEFAULT_START_SECONDS);
    if !seconds.is_finite() || seconds.abs() > MAX_START_SECONDS {
        warn!("Rejected start request for {} seconds", seconds);
        return Err(bad_request(format!(
            "seconds must be a number between -{0} and {0}",
            MAX_START_SECONDS
        )));
    }

    state.post_action(ControlAction::Start { seconds });
    Ok(Json(ApiResponse::ok(format!("Countdown started: {} seconds", seconds))))
}

/// Handle POST /control/stop - Stop the countdown
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.post_action(ControlAction::Stop);
    Json(ApiResponse::ok("Countdown stopped"))
}

/// Handle POST /control/reset - Stop and zero the countdown
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    state.post_action(ControlAction::Reset);
    Json(ApiResponse::ok("Countdown reset"))
}

/// Handle POST /control/music - Change the celebration track
pub async fn music_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let request: MusicRequest = parse_body(&body)?;
    let url = request.url.map(|url| url.trim().to_string()).unwrap_or_default();
    if url.is_empty() {
        return Err(bad_request("No URL provided"));
    }
    if !is_valid_music_url(&url) {
        return Err(bad_request("Invalid URL"));
    }

    info!("Music URL updated to: {}", url);
    state.control.set_music_url(url.clone());
    state.record_action("music");
    Ok(Json(ApiResponse::ok("Music URL updated").with_url(url)))
}

/// Handle POST /control/speak-intervals - Toggle spoken 10 s marks
pub async fn speak_intervals_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ApiResponse>, ApiError> {
    let request: SpeakIntervalsRequest = parse_body(&body)?;
    let Some(enabled) = request.enabled else {
        return Err(bad_request("Missing 'enabled' flag"));
    };

    info!("Speak intervals {}", if enabled { "enabled" } else { "disabled" });
    state.control.set_speak_intervals(enabled);
    state.record_action("speak-intervals");
    let message = if enabled { "Interval announcements on" } else { "Interval announcements off" };
    Ok(Json(ApiResponse::ok(message).with_enabled(enabled)))
}

/// Handle GET /easter-egg/:secret - Arm the special celebration
pub async fn easter_egg_handler(
    State(state): State<Arc<AppState>>,
    Path(secret): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let secret = secret.to_lowercase();
    if !EASTER_EGG_SECRETS.contains(&secret.as_str()) {
        return Err((StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))));
    }

    info!("Easter egg armed for the next celebration");
    state.control.trigger_easter_egg();
    state.record_action("easter-egg");
    Ok(Json(ApiResponse::ok(format!("{} Easter egg activated!", state.emoji))))
}

/// Handle GET /video_feed - MJPEG camera stream
pub async fn video_feed_handler(State(state): State<Arc<AppState>>) -> Response {
    state.frames.subscribe().into_response(state.stop.clone())
}

/// Handle GET /camera/test - One JPEG straight from the camera
pub async fn camera_test_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.camera.grab().await {
        Ok(Some(jpeg)) => ([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(ErrorResponse::new("No frame available"))).into_response(),
        Err(e) => {
            warn!("Camera test failed: {}", e);
            (StatusCode::NOT_FOUND, Json(ErrorResponse::new(e))).into_response()
        }
    }
}

/// Handle GET /status - Server and countdown status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let controls = state.control.snapshot();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        phase: state.countdown.snapshot().phase,
        running: controls.running,
        speak_intervals: controls.speak_intervals,
        music_url: controls.music_url,
        camera_available: state.camera_available(),
        viewers: state.frames.subscriber_count(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
