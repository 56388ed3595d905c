//! Configuration and CLI argument handling

use std::{env, path::PathBuf};
use clap::Parser;

use crate::{error::TimerError, storage::TimerFile};

/// Environment variable that overrides the data directory
pub const DATA_DIR_ENV: &str = "MULTI_TIMER_ROOT";

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "multi-timer")]
#[command(about = "A local HTTP service for managing several persistent countdown timers")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding timers.json, can also be set with $MULTI_TIMER_ROOT
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Program to run when a timer finishes, called with the alert title as its argument
    #[arg(short, long)]
    pub alert_command: Option<String>,

    /// Do not raise alerts at all
    #[arg(long, conflicts_with = "alert_command")]
    pub no_alerts: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Where timers are saved: `--data-dir`, then $MULTI_TIMER_ROOT, then the user data directory
    pub fn timer_file(&self) -> Result<TimerFile, TimerError> {
        let explicit = self
            .data_dir
            .clone()
            .or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from));

        match explicit {
            Some(dir) => Ok(TimerFile::in_dir(&dir)),
            None => TimerFile::default_location(),
        }
    }
}
