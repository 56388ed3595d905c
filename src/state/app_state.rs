//! Shared application state handed to every handler and background task

use std::{sync::Mutex, time::Instant};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::warn;

use super::{StoreEvent, TimerStore};

/// Process-wide state: the timer store plus server metadata
///
/// The store itself has no locking; all access goes through `with_store`,
/// which serialises it behind a single mutex.
pub struct AppState {
    store: Mutex<TimerStore>,
    /// Clone of the store's event sender, so subscribing needs no lock
    events: broadcast::Sender<StoreEvent>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
}

impl AppState {
    pub fn new(store: TimerStore, port: u16, host: String) -> Self {
        let events = store.event_sender();

        Self {
            store: Mutex::new(store),
            events,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
        }
    }

    /// Run `f` with exclusive access to the store
    pub fn with_store<R>(&self, f: impl FnOnce(&mut TimerStore) -> R) -> Result<R, String> {
        let mut store = self
            .store
            .lock()
            .map_err(|e| format!("Failed to lock timer store: {}", e))?;
        Ok(f(&mut store))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Remember the last command issued through the API
    pub fn record_action(&self, action: &str) {
        match self.last_action.lock() {
            Ok(mut last_action) => *last_action = Some(action.to_string()),
            Err(e) => warn!("Failed to record last action: {}", e),
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
