//! Expiry watch background task

use std::{sync::Arc, time::Duration};
use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Once a second, stop every running timer that has passed its target
///
/// Timers only notice expiry when observed. This task observes them so that
/// subscribers hear about a finished timer and the file is updated even when
/// no client is polling.
pub async fn expiry_watch_task(state: Arc<AppState>) {
    info!("Starting expiry watch task");

    let mut interval = interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        match state.with_store(|store| store.refresh_expired(Utc::now())) {
            Ok(0) => {}
            Ok(expired) => debug!("{} timer(s) reached zero", expired),
            Err(e) => warn!("Failed to check timers for expiry: {}", e),
        }
    }
}
