//! Background tasks module
//!
//! This module contains the tasks that run alongside the HTTP server: the
//! countdown run loop that owns the robot, and the camera capture loop.

pub mod countdown;
pub mod frame_capture;
pub mod performer;

// Re-export main items
pub use countdown::{CountdownRunner, RunSettings};
pub use frame_capture::frame_capture_task;
pub use performer::Performer;
