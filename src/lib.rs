//! Reachy Countdown - a countdown and celebration show for the Reachy Mini
//!
//! A single run loop owns the robot and walks a countdown through its
//! phases, while an HTTP control panel posts start/stop/reset actions,
//! tweaks settings and streams the robot camera.

pub mod api;
pub mod choreography;
pub mod config;
pub mod media;
pub mod robot;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::AppState;
pub use tasks::{CountdownRunner, RunSettings};
pub use utils::{shutdown_signal, StopSignal};
