//! One-shot alert scheduling
//!
//! Timers never fire anything themselves. They ask an [`AlertScheduler`] to
//! raise an alert after a delay and to cancel it again when they leave the
//! running state. The scheduler is injected so tests can observe the calls.

pub mod local;
pub mod memory;

use std::time::Duration;

pub use local::LocalAlertScheduler;
pub use memory::InMemoryScheduler;

/// Collaborator that raises a single alert per identifier
///
/// Scheduling with an identifier that already has a pending alert replaces
/// it. Cancelling an identifier with nothing pending does nothing.
pub trait AlertScheduler: Send + Sync {
    fn schedule(&self, identifier: &str, title: &str, delay: Duration);

    fn cancel(&self, identifier: &str);
}
