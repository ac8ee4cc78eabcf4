//! Run-loop errors.

use thiserror::Error;

/// Errors surfaced by the agent loop machinery itself.
///
/// Handler failures do not appear here; they travel the failure channel and
/// are normalized by `alerthub-agentlib`. These variants cover the ordinary
/// `Result` path of setup, configuration, and restart bookkeeping.
#[derive(Debug, Error)]
pub enum RunLoopError {
    /// Plugin setup failed while (re)building the handler table.
    #[error("Plugin setup failed: {0}")]
    Setup(String),

    /// Maximum restart count exceeded within the restart window.
    #[error("Maximum restart count ({max}) exceeded")]
    MaxRestartsExceeded { max: u32 },

    /// A handler failure the configured policy treats as fatal.
    #[error("Fatal handler failure: {0}")]
    FatalFailure(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read a configuration file.
    #[error("Failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Failed to parse a configuration file.
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
