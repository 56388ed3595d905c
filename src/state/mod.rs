//! State management module
//!
//! The timer entity, the store that owns and persists the timers, and the
//! shared application state wrapped around them.

pub mod app_state;
pub mod store;
pub mod timer;

// Re-export main types
pub use app_state::AppState;
pub use store::{StoreEvent, TimerStore};
pub use timer::{RunState, Timer, TimerChange, TimerSnapshot};
