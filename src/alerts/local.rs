//! Alerts raised by this process on its own tokio runtime

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::{process::Command, runtime::Handle, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use super::AlertScheduler;

struct PendingAlert {
    generation: u64,
    task: JoinHandle<()>,
}

/// Scheduler that keeps one sleeping task per pending alert
///
/// When an alert fires it is logged and, if an alert command was
/// configured, that program is run with the alert title as its only
/// argument (for example `notify-send`). Pending alerts do not survive a
/// restart of the process.
pub struct LocalAlertScheduler {
    runtime: Handle,
    command: Option<String>,
    pending: Arc<Mutex<HashMap<String, PendingAlert>>>,
    next_generation: AtomicU64,
}

impl LocalAlertScheduler {
    /// Create a scheduler on the current tokio runtime
    ///
    /// Must be called from within a runtime.
    pub fn new(command: Option<String>) -> Self {
        Self::with_handle(Handle::current(), command)
    }

    pub fn with_handle(runtime: Handle, command: Option<String>) -> Self {
        Self {
            runtime,
            command,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Number of alerts waiting to fire
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }
}

impl AlertScheduler for LocalAlertScheduler {
    fn schedule(&self, identifier: &str, title: &str, delay: Duration) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(e) => {
                warn!("Failed to lock pending alerts, alert for {} not scheduled: {}", identifier, e);
                return;
            }
        };

        let key = identifier.to_string();
        let title = title.to_string();
        let command = self.command.clone();
        let registry = Arc::clone(&self.pending);

        let task = self.runtime.spawn(async move {
            sleep(delay).await;
            fire_alert(&title, command.as_deref()).await;

            // Only forget the entry if it was not superseded in the meantime
            if let Ok(mut pending) = registry.lock() {
                if pending.get(&key).is_some_and(|p| p.generation == generation) {
                    pending.remove(&key);
                }
            }
        });

        debug!("Scheduled alert for {} in {:.1}s", identifier, delay.as_secs_f64());
        if let Some(previous) = pending.insert(identifier.to_string(), PendingAlert { generation, task }) {
            debug!("Superseded previous alert for {}", identifier);
            previous.task.abort();
        }
    }

    fn cancel(&self, identifier: &str) {
        match self.pending.lock() {
            Ok(mut pending) => {
                if let Some(previous) = pending.remove(identifier) {
                    previous.task.abort();
                    debug!("Cancelled alert for {}", identifier);
                }
            }
            Err(e) => warn!("Failed to lock pending alerts, could not cancel {}: {}", identifier, e),
        }
    }
}

/// Raise the alert: log it and run the configured command, if any
async fn fire_alert(title: &str, command: Option<&str>) {
    info!("Timer finished: {}", title);

    let Some(command) = command else {
        return;
    };

    debug!("Running alert command {}", command);
    match Command::new(command).arg(title).output().await {
        Ok(output) if output.status.success() => {
            debug!("Alert command {} completed", command);
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Alert command {} failed: {}", command, stderr);
        }
        Err(e) => warn!("Failed to execute alert command {}: {}", command, e),
    }
}
