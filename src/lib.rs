//! Multi Timer - several named countdown timers behind a local HTTP API
//!
//! Timers can be started, paused and stopped independently, survive
//! restarts of the process without losing track of elapsed time, and raise
//! a local alert when they reach zero.

pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use alerts::{AlertScheduler, InMemoryScheduler, LocalAlertScheduler};
pub use api::create_router;
pub use config::Config;
pub use error::TimerError;
pub use state::{AppState, RunState, Timer, TimerStore};
pub use storage::TimerFile;
pub use utils::signals::shutdown_signal;
