//! Ordered, persisted collection of timers
//!
//! The store is the only owner of its timers and the only way to change
//! them. Everything is saved before the mutating call returns: a timer state
//! change is announced and then written, a change to the sequence itself is
//! written and then announced if the count moved.

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::timer::{RunState, Timer, TimerChange, TimerSnapshot};
use crate::{alerts::AlertScheduler, error::TimerError, storage::TimerFile};

/// Notification sent to store subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// The number of timers changed
    CountChanged { count: usize },
    /// A timer changed its run state
    TimerChanged { identifier: String, state: RunState },
}

impl StoreEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::CountChanged { .. } => "count_changed",
            StoreEvent::TimerChanged { .. } => "timer_changed",
        }
    }
}

impl From<TimerChange> for StoreEvent {
    fn from(change: TimerChange) -> Self {
        StoreEvent::TimerChanged {
            identifier: change.identifier,
            state: change.state,
        }
    }
}

pub struct TimerStore {
    timers: Vec<Timer>,
    file: TimerFile,
    alerts: Arc<dyn AlertScheduler>,
    events: broadcast::Sender<StoreEvent>,
}

impl TimerStore {
    /// Load the store from `file`, starting empty if it cannot be read
    pub fn open(file: TimerFile, alerts: Arc<dyn AlertScheduler>) -> Self {
        Self::open_at(file, alerts, Utc::now())
    }

    pub fn open_at(file: TimerFile, alerts: Arc<dyn AlertScheduler>, now: DateTime<Utc>) -> Self {
        let timers = Self::load(&file, &alerts, now);
        let (events, _) = broadcast::channel(100);

        Self {
            timers,
            file,
            alerts,
            events,
        }
    }

    /// Read and restore all timers; any failure yields an empty collection
    fn load(file: &TimerFile, alerts: &Arc<dyn AlertScheduler>, now: DateTime<Utc>) -> Vec<Timer> {
        let records = match file.read() {
            Ok(Some(records)) => records,
            Ok(None) => {
                info!("No saved timers at {}, starting empty", file.path().display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to read timers from {}: {}", file.path().display(), e);
                return Vec::new();
            }
        };

        match records
            .into_iter()
            .map(|record| Timer::restore(record, Arc::clone(alerts), now))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(timers) => {
                info!("Loaded {} timer(s) from {}", timers.len(), file.path().display());
                timers
            }
            Err(e) => {
                warn!("Discarding saved timers from {}: {}", file.path().display(), e);
                Vec::new()
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Sender side of the event channel, for subscribing without the store
    pub fn event_sender(&self) -> broadcast::Sender<StoreEvent> {
        self.events.clone()
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.timers.iter().position(|t| t.identifier() == identifier)
    }

    /// Swap in a whole new sequence
    ///
    /// Timers left out are dropped, which cancels their alerts. Subscribers
    /// hear about it only when the count changed; the file is written either
    /// way.
    pub fn replace_all(&mut self, timers: Vec<Timer>) {
        let previous_count = self.timers.len();
        self.timers = timers;
        self.committed(previous_count);
    }

    /// Edit the sequence in place, then persist and notify like `replace_all`
    pub fn mutate<R>(&mut self, edit: impl FnOnce(&mut Vec<Timer>) -> R) -> R {
        let previous_count = self.timers.len();
        let result = edit(&mut self.timers);
        self.committed(previous_count);
        result
    }

    fn committed(&self, previous_count: usize) {
        self.persist();

        if self.timers.len() != previous_count {
            self.notify(StoreEvent::CountChanged { count: self.timers.len() });
        }
    }

    /// Create a timer at the end of the list and return its identifier
    pub fn add(
        &mut self,
        name: impl Into<String>,
        duration: Duration,
    ) -> Result<String, TimerError> {
        let timer = Timer::new(name, duration, Arc::clone(&self.alerts))?;
        let identifier = timer.identifier().to_string();
        info!("Adding timer {} ({})", identifier, timer.alert_title());

        self.mutate(|timers| timers.push(timer));
        Ok(identifier)
    }

    /// Delete the timer at `index`
    pub fn remove(&mut self, index: usize) -> Result<(), TimerError> {
        let len = self.timers.len();
        if index >= len {
            return Err(TimerError::IndexOutOfRange { index, len });
        }

        self.mutate(|timers| {
            let timer = timers.remove(index);
            info!("Deleting timer {}", timer.identifier());
        });
        Ok(())
    }

    pub fn remove_by_id(&mut self, identifier: &str) -> Result<(), TimerError> {
        let index = self
            .position(identifier)
            .ok_or_else(|| TimerError::UnknownTimer(identifier.to_string()))?;
        self.remove(index)
    }

    /// Move the timer at `from` so that it ends up at `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<(), TimerError> {
        let len = self.timers.len();
        for index in [from, to] {
            if index >= len {
                return Err(TimerError::IndexOutOfRange { index, len });
            }
        }

        debug!("Moving timer from position {} to {}", from, to);
        self.mutate(|timers| {
            let timer = timers.remove(from);
            timers.insert(to, timer);
        });
        Ok(())
    }

    /// Start, pause or stop one timer
    pub fn set_run_state(
        &mut self,
        identifier: &str,
        requested: RunState,
        now: DateTime<Utc>,
    ) -> Result<RunState, TimerError> {
        let index = self
            .position(identifier)
            .ok_or_else(|| TimerError::UnknownTimer(identifier.to_string()))?;

        let timer = &mut self.timers[index];
        let change = timer.set_run_state_at(requested, now);
        let state = timer.run_state_at(now);

        if let Some(change) = change {
            self.timer_changed(change);
        }
        Ok(state)
    }

    /// Look at one timer, applying lazy expiry first
    pub fn get(
        &mut self,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Result<TimerSnapshot, TimerError> {
        let index = self
            .position(identifier)
            .ok_or_else(|| TimerError::UnknownTimer(identifier.to_string()))?;

        if let Some(change) = self.timers[index].refresh_at(now) {
            self.timer_changed(change);
        }
        Ok(self.timers[index].snapshot_at(now))
    }

    /// Look at every timer in order, applying lazy expiry first
    pub fn snapshot(&mut self, now: DateTime<Utc>) -> Vec<TimerSnapshot> {
        self.refresh_expired(now);
        self.timers.iter_mut().map(|t| t.snapshot_at(now)).collect()
    }

    /// Stop every running timer that is past its target, returning how many
    pub fn refresh_expired(&mut self, now: DateTime<Utc>) -> usize {
        let changes: Vec<TimerChange> = self
            .timers
            .iter_mut()
            .filter_map(|t| t.refresh_at(now))
            .collect();

        let expired = changes.len();
        for change in changes {
            self.timer_changed(change);
        }
        expired
    }

    /// Write the whole collection; failures are logged and otherwise ignored
    pub fn persist(&self) {
        let records: Vec<_> = self.timers.iter().map(Timer::to_record).collect();
        if let Err(e) = self.file.write(&records) {
            warn!("Failed to save timers to {}: {}", self.file.path().display(), e);
        }
    }

    fn timer_changed(&self, change: TimerChange) {
        self.notify(change.into());
        self.persist();
    }

    fn notify(&self, event: StoreEvent) {
        // Having nobody listening is normal
        if self.events.send(event).is_err() {
            debug!("No subscribers for store event");
        }
    }
}
