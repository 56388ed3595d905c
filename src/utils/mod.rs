//! Utility functions module
//!
//! Duration formatting and process signal handling.

pub mod hms;
pub mod signals;

// Re-export main functions
pub use hms::{countdown_string, hms_string};
pub use signals::shutdown_signal;
