//! Error type shared by the timer model, the store and the file layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("Timer duration must be greater than zero, got {0}s")]
    NonPositiveDuration(f64),
    #[error("Saved duration {0} is not a representable number of seconds")]
    UnrepresentableDuration(f64),
    #[error("No timer with identifier {0}")]
    UnknownTimer(String),
    #[error("Index {index} is out of range for {len} timers")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed timer file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not determine a data directory for this user")]
    NoDataDir,
}
