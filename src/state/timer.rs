//! A single countdown timer and its run-state machine
//!
//! Remaining time is never stored for a running timer. Instead the timer
//! remembers the absolute instant at which it reaches zero and computes the
//! remainder on demand, so it stays correct no matter how rarely it is
//! observed or how long the process was gone.
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --start--> Running
//!   ^                |                  |
//!   +------stop------+-------stop-------+
//! ```

use std::{fmt, sync::Arc};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    alerts::AlertScheduler,
    error::TimerError,
    storage::TimerRecord,
    utils::hms::{as_seconds_f64, from_seconds_f64, hms_string},
};

/// Seconds a running timer may sit past its target before it counts as stopped
pub const EXPIRY_GRACE_SECONDS: i64 = 1;

/// Externally visible run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunState::Stopped => "stopped",
            RunState::Running => "running",
            RunState::Paused => "paused",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InnerState {
    Idle,
    Running { target: DateTime<Utc> },
    Paused { remaining: Duration },
}

impl InnerState {
    fn run_state(&self) -> RunState {
        match self {
            InnerState::Idle => RunState::Stopped,
            InnerState::Running { .. } => RunState::Running,
            InnerState::Paused { .. } => RunState::Paused,
        }
    }
}

/// Emitted whenever a timer's internal state actually changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerChange {
    pub identifier: String,
    pub state: RunState,
}

/// Read-only view of a timer at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub identifier: String,
    pub name: String,
    pub configured: Duration,
    pub state: RunState,
    pub remaining: Duration,
}

/// One countdown
///
/// Dropping a timer cancels its pending alert.
pub struct Timer {
    identifier: String,
    name: String,
    configured: Duration,
    inner: InnerState,
    alerts: Arc<dyn AlertScheduler>,
}

impl Timer {
    /// Create a stopped timer with a fresh identifier
    pub fn new(
        name: impl Into<String>,
        duration: Duration,
        alerts: Arc<dyn AlertScheduler>,
    ) -> Result<Self, TimerError> {
        if duration <= Duration::zero() {
            return Err(TimerError::NonPositiveDuration(as_seconds_f64(duration)));
        }

        Ok(Self {
            identifier: Uuid::new_v4().to_string(),
            name: name.into(),
            configured: duration,
            inner: InnerState::Idle,
            alerts,
        })
    }

    /// Rebuild a timer from its persisted record
    ///
    /// A running timer whose target has already passed comes back stopped.
    /// One that is still counting down comes back running and its alert is
    /// requested again, because pending alerts do not outlive the process.
    pub fn restore(
        record: TimerRecord,
        alerts: Arc<dyn AlertScheduler>,
        now: DateTime<Utc>,
    ) -> Result<Self, TimerError> {
        let configured = seconds(record.configured_duration)?;
        if configured <= Duration::zero() {
            return Err(TimerError::NonPositiveDuration(record.configured_duration));
        }

        let inner = match (record.target_instant, record.remaining_duration) {
            (Some(target), _) if target > now => InnerState::Running { target },
            (Some(_), _) => InnerState::Idle,
            (None, Some(remaining)) => match seconds(remaining)? {
                remaining if remaining > Duration::zero() => InnerState::Paused { remaining },
                _ => InnerState::Idle,
            },
            (None, None) => InnerState::Idle,
        };

        let timer = Self {
            identifier: record.identifier,
            name: record.name,
            configured,
            inner,
            alerts,
        };
        if let InnerState::Running { target } = timer.inner {
            debug!("Restored running timer {}, rescheduling its alert", timer.identifier);
            timer.schedule_alert(target - now);
        }

        Ok(timer)
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configured_duration(&self) -> Duration {
        self.configured
    }

    pub fn run_state(&mut self) -> RunState {
        self.run_state_at(Utc::now())
    }

    pub fn run_state_at(&mut self, now: DateTime<Utc>) -> RunState {
        self.refresh_at(now);
        self.inner.run_state()
    }

    pub fn remaining(&mut self) -> Duration {
        self.remaining_at(Utc::now())
    }

    /// Time left on the countdown
    ///
    /// Can be zero or slightly negative for up to [`EXPIRY_GRACE_SECONDS`] after the
    /// target passes; callers should treat that as expired.
    pub fn remaining_at(&mut self, now: DateTime<Utc>) -> Duration {
        self.refresh_at(now);
        match self.inner {
            InnerState::Idle => self.configured,
            InnerState::Running { target } => target - now,
            InnerState::Paused { remaining } => remaining,
        }
    }

    pub fn snapshot_at(&mut self, now: DateTime<Utc>) -> TimerSnapshot {
        let remaining = self.remaining_at(now);
        TimerSnapshot {
            identifier: self.identifier.clone(),
            name: self.name.clone(),
            configured: self.configured,
            state: self.inner.run_state(),
            remaining,
        }
    }

    /// Stop a running timer that is past its target by more than the grace
    ///
    /// This is the only transition that happens without a command. The alert
    /// has already fired by then, so nothing is cancelled.
    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> Option<TimerChange> {
        let expired_before = now - Duration::seconds(EXPIRY_GRACE_SECONDS);
        match self.inner {
            InnerState::Running { target } if target < expired_before => {
                debug!("Timer {} reached zero", self.identifier);
                self.inner = InnerState::Idle;
                Some(self.change())
            }
            _ => None,
        }
    }

    pub fn set_run_state(&mut self, requested: RunState) -> Option<TimerChange> {
        self.set_run_state_at(requested, Utc::now())
    }

    /// Apply a start, pause or stop command
    ///
    /// Returns the change when the internal state differs afterwards,
    /// including a lazy expiry noticed on the way in. Stop always resets the
    /// countdown and always cancels the alert.
    pub fn set_run_state_at(
        &mut self,
        requested: RunState,
        now: DateTime<Utc>,
    ) -> Option<TimerChange> {
        let before = self.inner;
        self.refresh_at(now);

        match (self.inner, requested) {
            (InnerState::Idle, RunState::Running) => {
                self.inner = InnerState::Running { target: deadline(now, self.configured) };
                self.schedule_alert(self.configured);
            }
            (InnerState::Paused { remaining }, RunState::Running) => {
                self.inner = InnerState::Running { target: deadline(now, remaining) };
                self.schedule_alert(remaining);
            }
            (InnerState::Running { target }, RunState::Paused) if target <= now => {
                debug!("Timer {} reached zero before the pause", self.identifier);
                self.inner = InnerState::Idle;
            }
            (InnerState::Running { target }, RunState::Paused) => {
                self.inner = InnerState::Paused { remaining: target - now };
                self.alerts.cancel(&self.identifier);
            }
            (_, RunState::Stopped) => {
                self.inner = InnerState::Idle;
                self.alerts.cancel(&self.identifier);
            }
            (InnerState::Running { .. }, RunState::Running)
            | (InnerState::Idle | InnerState::Paused { .. }, RunState::Paused) => {}
        }

        if self.inner == before {
            None
        } else {
            debug!("Timer {} is now {:?}", self.identifier, self.inner.run_state());
            Some(self.change())
        }
    }

    /// Alert title: configured duration followed by the name
    pub fn alert_title(&self) -> String {
        format!("{} {}", hms_string(self.configured), self.name)
    }

    pub fn to_record(&self) -> TimerRecord {
        let (target_instant, remaining_duration) = match self.inner {
            InnerState::Idle => (None, None),
            InnerState::Running { target } => (Some(target), None),
            InnerState::Paused { remaining } => (None, Some(as_seconds_f64(remaining))),
        };

        TimerRecord {
            name: self.name.clone(),
            configured_duration: as_seconds_f64(self.configured),
            identifier: self.identifier.clone(),
            target_instant,
            remaining_duration,
        }
    }

    fn change(&self) -> TimerChange {
        TimerChange {
            identifier: self.identifier.clone(),
            state: self.inner.run_state(),
        }
    }

    fn schedule_alert(&self, delay: Duration) {
        let delay = delay.to_std().unwrap_or_default();
        self.alerts.schedule(&self.identifier, &self.alert_title(), delay);
    }
}

fn seconds(value: f64) -> Result<Duration, TimerError> {
    from_seconds_f64(value).ok_or(TimerError::UnrepresentableDuration(value))
}

fn deadline(now: DateTime<Utc>, remaining: Duration) -> DateTime<Utc> {
    now.checked_add_signed(remaining).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.alerts.cancel(&self.identifier);
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("identifier", &self.identifier)
            .field("name", &self.name)
            .field("configured", &self.configured)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::alerts::InMemoryScheduler;
    use chrono::TimeZone;

    fn start_of_test() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
    }

    fn tea(alerts: &Arc<InMemoryScheduler>) -> Timer {
        Timer::new("Tea", Duration::seconds(300), alerts.clone()).unwrap()
    }

    #[test]
    fn new_timer_is_stopped_with_full_duration() {
        let alerts = Arc::new(InMemoryScheduler::new());
        for seconds in [1, 59, 300, 86_399] {
            let mut timer = Timer::new("t", Duration::seconds(seconds), alerts.clone()).unwrap();
            assert_eq!(timer.run_state(), RunState::Stopped);
            assert_eq!(timer.remaining(), Duration::seconds(seconds));
        }
        assert!(alerts.scheduled().is_empty());
    }

    #[test]
    fn rejects_non_positive_duration() {
        let alerts = Arc::new(InMemoryScheduler::new());
        assert!(matches!(
            Timer::new("t", Duration::zero(), alerts.clone()),
            Err(TimerError::NonPositiveDuration(_))
        ));
        assert!(Timer::new("t", Duration::seconds(-5), alerts).is_err());
    }

    #[test]
    fn identifiers_are_unique() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let a = tea(&alerts);
        let b = tea(&alerts);
        assert_ne!(a.identifier(), b.identifier());
    }

    #[test]
    fn start_keeps_full_remaining_time() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let mut timer = tea(&alerts);

        let change = timer.set_run_state(RunState::Running);
        assert_eq!(change.map(|c| c.state), Some(RunState::Running));

        let remaining = timer.remaining();
        assert!(remaining <= Duration::seconds(300));
        assert!(remaining > Duration::seconds(299));
    }

    #[test]
    fn tea_scenario() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);
        let id = timer.identifier().to_string();

        assert_eq!(timer.run_state_at(now), RunState::Stopped);
        assert_eq!(timer.remaining_at(now), Duration::seconds(300));

        timer.set_run_state_at(RunState::Running, now);
        assert_eq!(timer.remaining_at(now), Duration::seconds(300));
        let alert = alerts.pending(&id).unwrap();
        assert_eq!(alert.delay, std::time::Duration::from_secs(300));
        assert_eq!(alert.title, "00:05:00 Tea");

        let later = now + Duration::seconds(100);
        timer.set_run_state_at(RunState::Paused, later);
        assert_eq!(timer.run_state_at(later), RunState::Paused);
        assert_eq!(timer.remaining_at(later), Duration::seconds(200));
        assert!(alerts.pending(&id).is_none());
        assert_eq!(alerts.cancelled(), vec![id.clone()]);

        let resumed = later + Duration::hours(3);
        timer.set_run_state_at(RunState::Running, resumed);
        assert_eq!(timer.remaining_at(resumed), Duration::seconds(200));
        assert_eq!(alerts.pending(&id).unwrap().delay, std::time::Duration::from_secs(200));
    }

    #[test]
    fn pause_freezes_remaining_time() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);

        timer.set_run_state_at(RunState::Running, now);
        timer.set_run_state_at(RunState::Paused, now + Duration::seconds(42));

        for wait in [0, 60, 86_400] {
            let at = now + Duration::seconds(42 + wait);
            assert_eq!(timer.remaining_at(at), Duration::seconds(258));
            assert_eq!(timer.run_state_at(at), RunState::Paused);
        }
    }

    #[test]
    fn stop_resets_from_any_state() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();

        let mut stopped = tea(&alerts);
        assert!(stopped.set_run_state_at(RunState::Stopped, now).is_none());

        let mut running = tea(&alerts);
        running.set_run_state_at(RunState::Running, now);

        let mut paused = tea(&alerts);
        paused.set_run_state_at(RunState::Running, now);
        paused.set_run_state_at(RunState::Paused, now + Duration::seconds(10));

        let later = now + Duration::seconds(20);
        for timer in [&mut stopped, &mut running, &mut paused] {
            timer.set_run_state_at(RunState::Stopped, later);
            assert_eq!(timer.run_state_at(later), RunState::Stopped);
            assert_eq!(timer.remaining_at(later), Duration::seconds(300));
            assert!(alerts.pending(timer.identifier()).is_none());
        }
    }

    #[test]
    fn no_op_commands_report_no_change() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);

        assert!(timer.set_run_state_at(RunState::Paused, now).is_none());
        assert!(timer.set_run_state_at(RunState::Running, now).is_some());
        assert!(timer.set_run_state_at(RunState::Running, now + Duration::seconds(5)).is_none());
        assert_eq!(alerts.scheduled().len(), 1);

        assert!(timer.set_run_state_at(RunState::Paused, now + Duration::seconds(6)).is_some());
        assert!(timer.set_run_state_at(RunState::Paused, now + Duration::seconds(7)).is_none());
    }

    #[test]
    fn running_timer_expires_after_grace() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);
        timer.set_run_state_at(RunState::Running, now);

        let at_zero = now + Duration::seconds(300);
        assert_eq!(timer.run_state_at(at_zero), RunState::Running);
        assert_eq!(
            timer.remaining_at(at_zero + Duration::milliseconds(500)),
            Duration::milliseconds(-500)
        );

        let past = now + Duration::seconds(302);
        let change = timer.refresh_at(past);
        assert_eq!(change.map(|c| c.state), Some(RunState::Stopped));
        assert_eq!(timer.remaining_at(past), Duration::seconds(300));
        assert!(timer.refresh_at(past).is_none());
        assert!(alerts.cancelled().is_empty());
    }

    #[test]
    fn pausing_an_expired_timer_leaves_it_stopped() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);
        timer.set_run_state_at(RunState::Running, now);

        let change = timer.set_run_state_at(RunState::Paused, now + Duration::seconds(400));
        assert_eq!(change.map(|c| c.state), Some(RunState::Stopped));
        assert_eq!(timer.run_state_at(now + Duration::seconds(400)), RunState::Stopped);
    }

    #[test]
    fn pausing_at_zero_stops_without_a_second_alert() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);
        timer.set_run_state_at(RunState::Running, now);

        let in_grace = now + Duration::milliseconds(300_500);
        let change = timer.set_run_state_at(RunState::Paused, in_grace);
        assert_eq!(change.map(|c| c.state), Some(RunState::Stopped));
        assert_eq!(timer.remaining_at(in_grace), Duration::seconds(300));
        assert_eq!(timer.to_record().remaining_duration, None);

        let resumed = in_grace + Duration::hours(1);
        timer.set_run_state_at(RunState::Running, resumed);
        let delays: Vec<_> = alerts.scheduled().into_iter().map(|a| a.delay).collect();
        assert_eq!(delays, vec![std::time::Duration::from_secs(300); 2]);
    }

    #[test]
    fn records_reflect_inner_state() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);

        let idle = timer.to_record();
        assert_eq!((idle.target_instant, idle.remaining_duration), (None, None));

        timer.set_run_state_at(RunState::Running, now);
        let running = timer.to_record();
        assert_eq!(running.target_instant, Some(now + Duration::seconds(300)));
        assert_eq!(running.remaining_duration, None);

        timer.set_run_state_at(RunState::Paused, now + Duration::milliseconds(99_500));
        let paused = timer.to_record();
        assert_eq!(paused.target_instant, None);
        assert_eq!(paused.remaining_duration, Some(200.5));
    }

    #[test]
    fn restore_running_keeps_target_and_reschedules() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);
        timer.set_run_state_at(RunState::Running, now);
        let record = timer.to_record();

        let restarted = now + Duration::seconds(60);
        let restored_alerts = Arc::new(InMemoryScheduler::new());
        let mut restored = Timer::restore(record, restored_alerts.clone(), restarted).unwrap();

        assert_eq!(restored.identifier(), timer.identifier());
        assert_eq!(restored.run_state_at(restarted), RunState::Running);
        assert_eq!(restored.remaining_at(restarted), Duration::seconds(240));
        assert_eq!(
            restored_alerts.pending(restored.identifier()).map(|a| a.delay),
            Some(std::time::Duration::from_secs(240))
        );
    }

    #[test]
    fn restore_after_target_passed_is_stopped() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let now = start_of_test();
        let mut timer = tea(&alerts);
        timer.set_run_state_at(RunState::Running, now);
        let record = timer.to_record();

        let restarted = now + Duration::minutes(10);
        let mut restored = Timer::restore(record, alerts.clone(), restarted).unwrap();

        assert_eq!(restored.run_state_at(restarted), RunState::Stopped);
        assert_eq!(restored.remaining_at(restarted), Duration::seconds(300));
    }

    #[test]
    fn restore_paused_ignores_wall_clock() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let record = TimerRecord {
            name: "Eggs".to_string(),
            configured_duration: 420.0,
            identifier: "E".to_string(),
            target_instant: None,
            remaining_duration: Some(61.25),
        };

        let mut restored = Timer::restore(record, alerts.clone(), start_of_test()).unwrap();

        assert_eq!(restored.run_state(), RunState::Paused);
        assert_eq!(restored.remaining(), Duration::milliseconds(61_250));
        assert!(alerts.scheduled().is_empty());
    }

    #[test]
    fn restore_with_nothing_left_is_stopped() {
        let alerts = Arc::new(InMemoryScheduler::new());
        for remaining in [0.0, -0.5] {
            let record = TimerRecord {
                name: "Eggs".to_string(),
                configured_duration: 420.0,
                identifier: "E".to_string(),
                target_instant: None,
                remaining_duration: Some(remaining),
            };

            let mut restored = Timer::restore(record, alerts.clone(), start_of_test()).unwrap();
            assert_eq!(restored.run_state(), RunState::Stopped);
            assert_eq!(restored.remaining(), Duration::seconds(420));

            restored.set_run_state_at(RunState::Running, start_of_test());
            assert_eq!(
                alerts.pending("E").map(|a| a.delay),
                Some(std::time::Duration::from_secs(420))
            );
        }
    }

    #[test]
    fn restore_rejects_unrepresentable_durations() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let records = [
            (-1e300, None),
            (1e300, None),
            (60.0, Some(-1e300)),
            (60.0, Some(f64::NAN)),
        ];

        for (configured_duration, remaining_duration) in records {
            let record = TimerRecord {
                name: "Bad".to_string(),
                configured_duration,
                identifier: "B".to_string(),
                target_instant: None,
                remaining_duration,
            };
            assert!(matches!(
                Timer::restore(record, alerts.clone(), start_of_test()),
                Err(TimerError::UnrepresentableDuration(_))
            ));
        }
        assert!(alerts.scheduled().is_empty());
    }

    #[test]
    fn restore_rejects_invalid_duration() {
        let alerts = Arc::new(InMemoryScheduler::new());
        for configured_duration in [0.0, -1.0, f64::NAN] {
            let record = TimerRecord {
                name: "Bad".to_string(),
                configured_duration,
                identifier: "B".to_string(),
                target_instant: None,
                remaining_duration: None,
            };
            assert!(Timer::restore(record, alerts.clone(), start_of_test()).is_err());
        }
    }

    #[test]
    fn drop_cancels_alert() {
        let alerts = Arc::new(InMemoryScheduler::new());
        let mut timer = tea(&alerts);
        let id = timer.identifier().to_string();
        timer.set_run_state(RunState::Running);
        assert!(alerts.pending(&id).is_some());

        drop(timer);
        assert!(alerts.pending(&id).is_none());
        assert_eq!(alerts.cancelled().last(), Some(&id));
    }
}
