//! HTTP API module
//!
//! This module contains the control panel page, the JSON control endpoints
//! and the camera stream.

pub mod handlers;
pub mod page;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/countdown", get(countdown_handler))
        .route("/control/start", post(start_handler))
        .route("/control/stop", post(stop_handler))
        .route("/control/reset", post(reset_handler))
        .route("/control/music", post(music_handler))
        .route("/control/speak-intervals", post(speak_intervals_handler))
        .route("/easter-egg/:secret", get(easter_egg_handler))
        .route("/video_feed", get(video_feed_handler))
        .route("/camera/test", get(camera_test_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
