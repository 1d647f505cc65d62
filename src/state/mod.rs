//! State management module
//!
//! The two shared records (countdown read-out and control mailbox) and the
//! application state that bundles them for the server and the run loop.

pub mod app_state;
pub mod control_state;
pub mod countdown_state;

// Re-export main types
pub use app_state::AppState;
pub use control_state::{ControlAction, ControlState, Controls, DEFAULT_START_SECONDS, MAX_START_SECONDS};
pub use countdown_state::{format_hms, CountdownSnapshot, CountdownState, Phase};
