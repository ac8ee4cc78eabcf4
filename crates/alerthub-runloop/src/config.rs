//! Run-loop configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RunLoopError;

/// What the loop does with a handler failure that is not a restart signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure, back off, keep processing messages.
    Continue,
    /// Terminate the loop with an error.
    Terminate,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Continue
    }
}

/// Agent loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLoopConfig {
    /// Capacity of the inbound message channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Sleep after a recoverable handler failure (in milliseconds).
    #[serde(default = "default_failure_backoff")]
    pub failure_backoff_ms: u64,

    /// Policy for handler failures.
    #[serde(default)]
    pub on_failure: FailurePolicy,

    /// Maximum number of restarts before giving up.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Time window for counting restarts (in seconds).
    #[serde(default = "default_restart_window")]
    pub restart_window_secs: u64,

    /// Delay before re-entering setup on a restart (in milliseconds).
    #[serde(default = "default_restart_delay")]
    pub restart_delay_ms: u64,
}

fn default_channel_capacity() -> usize {
    64
}

fn default_failure_backoff() -> u64 {
    60_000 // one minute between retries after a caught failure
}

fn default_max_restarts() -> u32 {
    10
}

fn default_restart_window() -> u64 {
    300 // 5 minutes
}

fn default_restart_delay() -> u64 {
    5_000
}

impl Default for RunLoopConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            failure_backoff_ms: default_failure_backoff(),
            on_failure: FailurePolicy::default(),
            max_restarts: default_max_restarts(),
            restart_window_secs: default_restart_window(),
            restart_delay_ms: default_restart_delay(),
        }
    }
}

impl RunLoopConfig {
    /// Load and validate a configuration from a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RunLoopError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate().map_err(RunLoopError::Config)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.channel_capacity == 0 {
            return Err("channel_capacity must be greater than 0".to_string());
        }
        if self.max_restarts == 0 {
            return Err("max_restarts must be greater than 0".to_string());
        }
        if self.restart_window_secs == 0 {
            return Err("restart_window_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Backoff after a recoverable handler failure.
    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }

    /// Window over which restarts are counted.
    pub fn restart_window(&self) -> Duration {
        Duration::from_secs(self.restart_window_secs)
    }

    /// Delay before re-entering setup on a restart.
    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}
