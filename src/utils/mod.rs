//! Utility functions module
//!
//! Signal handling and the cooperative stop flag shared by every task.

pub mod signals;
pub mod stop_signal;

// Re-export main items
pub use signals::{forward_shutdown_signal, shutdown_signal};
pub use stop_signal::StopSignal;
