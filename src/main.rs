//! Reachy Countdown - countdown and celebration show for the Reachy Mini
//!
//! This is the main entry point for the reachy-countdown application.

use std::sync::Arc;
use anyhow::Context;
use chrono::Local;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use reachy_countdown::{
    api::create_router,
    config::Config,
    media::{
        Announcer, CountdownVoice, FrameSource, LocalAnnouncer, MjpegRecorder, MutedAnnouncer,
        PlaceholderCamera, SnapshotCamera,
    },
    robot::{DaemonClient, PoseSink, SimulatedRobot},
    state::{AppState, ControlState},
    tasks::{frame_capture_task, CountdownRunner, RunSettings},
    utils::{forward_shutdown_signal, StopSignal},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("reachy_countdown={},tower_http=info", config.log_level()))
        .init();

    info!("Starting reachy-countdown v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, daemon={}, simulate={}, mute={}",
        config.host, config.port, config.daemon_url, config.simulate, config.mute
    );

    let stop = StopSignal::new();
    tokio::spawn(forward_shutdown_signal(stop.clone()));

    let initial_target = config
        .initial_target(Local::now())
        .map_err(anyhow::Error::msg)?;

    // Robot connection failure is fatal
    let robot: Arc<dyn PoseSink> = if config.simulate {
        info!("Using simulated robot");
        Arc::new(SimulatedRobot::new())
    } else {
        let client = DaemonClient::new(&config.daemon_url)?;
        info!("Connecting to Reachy Mini daemon at {}", client.base_url());
        if let Err(e) = client.connect().await {
            error!("Could not connect to Reachy Mini: {}", e);
            stop.trigger();
            return Err(e).context("robot connection failed");
        }
        info!("Connected to Reachy Mini");
        Arc::new(client)
    };

    let announcer: Arc<dyn Announcer> = if config.mute {
        info!("Audio muted, announcements are only logged");
        Arc::new(MutedAnnouncer::new())
    } else {
        let cache_dir = std::env::temp_dir().join("reachy-countdown");
        let voice = match tokio::fs::create_dir_all(&cache_dir).await {
            Ok(()) => CountdownVoice::prepare(&cache_dir).await,
            Err(e) => {
                warn!("Could not create audio cache {}: {}", cache_dir.display(), e);
                CountdownVoice::live_only()
            }
        };
        Arc::new(LocalAnnouncer::new(voice, cache_dir))
    };

    let camera: Arc<dyn FrameSource> = if config.no_camera {
        info!("Camera disabled, serving a placeholder frame");
        Arc::new(PlaceholderCamera::new().map_err(anyhow::Error::msg)?)
    } else {
        Arc::new(SnapshotCamera::new(&config.camera_url()).map_err(anyhow::Error::msg)?)
    };

    let recorder = match config.recording_path() {
        Some(path) => match MjpegRecorder::create(&path).await {
            Ok(recorder) => {
                info!("Recording camera feed to {}", path.display());
                Some(recorder)
            }
            Err(e) => {
                warn!("Recording disabled: {}", e);
                None
            }
        },
        None => None,
    };

    // Create application state
    let control = ControlState::new(config.music_url.clone(), config.speak_intervals);
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.emoji.clone(),
        control,
        camera,
        stop.clone(),
    ));

    // Start the camera capture background task
    let capture = tokio::spawn(frame_capture_task(Arc::clone(&state), recorder));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Control panel: {}", state.ui_url());
    info!("Endpoints:");
    info!("  GET  /                         - Control panel");
    info!("  GET  /countdown                - Countdown read-out");
    info!("  POST /control/start            - Start a countdown");
    info!("  POST /control/stop             - Stop the countdown");
    info!("  POST /control/reset            - Reset the countdown");
    info!("  POST /control/music            - Set the celebration music");
    info!("  POST /control/speak-intervals  - Toggle 10 second announcements");
    info!("  GET  /video_feed               - Camera stream");
    info!("  GET  /camera/test              - Single camera frame");
    info!("  GET  /status                   - Server status");
    info!("  GET  /health                   - Health check");

    let server_stop = stop.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_stop.wait().await })
            .await
    });

    let settings = RunSettings {
        celebration: config.celebration(),
        once: config.once,
        initial_target,
    };
    CountdownRunner::new(Arc::clone(&state), robot, announcer, settings)
        .run()
        .await;

    // The run loop only returns on shutdown or after a run-once celebration
    stop.trigger();

    match server.await {
        Ok(Err(e)) => error!("Server error: {}", e),
        Err(e) => error!("Server task failed: {}", e),
        Ok(Ok(())) => {}
    }
    if let Err(e) = capture.await {
        error!("Capture task failed: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
