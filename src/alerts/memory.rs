//! Alert scheduler that only records what it was asked to do

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use super::AlertScheduler;

/// A schedule request as seen by the scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAlert {
    pub identifier: String,
    pub title: String,
    pub delay: Duration,
}

#[derive(Debug, Default)]
struct Calls {
    scheduled: Vec<ScheduledAlert>,
    cancelled: Vec<String>,
    pending: HashMap<String, ScheduledAlert>,
}

/// In-process scheduler that never fires
///
/// Used when alerts are disabled and as the fake collaborator in tests.
#[derive(Debug, Default)]
pub struct InMemoryScheduler {
    calls: Mutex<Calls>,
}

impl InMemoryScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn calls(&self) -> MutexGuard<'_, Calls> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every schedule request received, oldest first
    pub fn scheduled(&self) -> Vec<ScheduledAlert> {
        self.calls().scheduled.clone()
    }

    /// Every identifier passed to `cancel`, oldest first
    pub fn cancelled(&self) -> Vec<String> {
        self.calls().cancelled.clone()
    }

    /// The alert that would currently fire for this identifier
    pub fn pending(&self, identifier: &str) -> Option<ScheduledAlert> {
        self.calls().pending.get(identifier).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.calls().pending.len()
    }
}

impl AlertScheduler for InMemoryScheduler {
    fn schedule(&self, identifier: &str, title: &str, delay: Duration) {
        let alert = ScheduledAlert {
            identifier: identifier.to_string(),
            title: title.to_string(),
            delay,
        };
        let mut calls = self.calls();
        calls.scheduled.push(alert.clone());
        calls.pending.insert(alert.identifier.clone(), alert);
    }

    fn cancel(&self, identifier: &str) {
        let mut calls = self.calls();
        calls.cancelled.push(identifier.to_string());
        calls.pending.remove(identifier);
    }
}
