//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod expiry_watch;

// Re-export main functions
pub use expiry_watch::expiry_watch_task;
