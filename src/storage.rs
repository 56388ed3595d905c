//! On-disk representation of the timer collection

use std::{
    fs,
    path::{Path, PathBuf},
};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TimerError;

pub const TIMERS_FILENAME: &str = "timers.json";

/// One persisted timer
///
/// A running timer stores only its absolute `target_instant`, so time that
/// passes while the process is not running is still counted on restore.
/// A paused timer stores `remaining_duration`. Neither field means idle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub name: String,
    /// Seconds
    pub configured_duration: f64,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_instant: Option<DateTime<Utc>>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_duration: Option<f64>,
}

/// The JSON file holding the ordered list of timer records
#[derive(Debug, Clone)]
pub struct TimerFile {
    path: PathBuf,
}

impl TimerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `timers.json` inside the given directory
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(TIMERS_FILENAME))
    }

    /// `timers.json` inside the per-user data directory
    pub fn default_location() -> Result<Self, TimerError> {
        let dirs = ProjectDirs::from("dev", "multi-timer", "multi-timer").ok_or(TimerError::NoDataDir)?;
        Ok(Self::in_dir(dirs.data_local_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records, `None` if nothing has been saved yet
    pub fn read(&self) -> Result<Option<Vec<TimerRecord>>, TimerError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let records = serde_json::from_str(&contents)?;
        Ok(Some(records))
    }

    /// Replace the file with the given records
    ///
    /// The data goes to a sibling temporary file first and is renamed over
    /// the real one, so a failed write never leaves a truncated file.
    pub fn write(&self, records: &[TimerRecord]) -> Result<(), TimerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Wrote {} timer(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}
