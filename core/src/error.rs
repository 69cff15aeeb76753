//! Error types for rgbench-core

use thiserror::Error;

/// Core error type
///
/// Only configuration, launch, and fatal abort conditions surface through
/// this type. Cleanup-phase errors are logged and swallowed at the site
/// where they occur (see [`crate::cleanup`]).
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing installation, malformed node config)
    #[error("configuration error: {0}")]
    Config(String),

    /// Launch error (a process never started)
    #[error("launch error: {0}")]
    Launch(String),

    /// Fatal abort: the master result could not be obtained, so the run
    /// cannot determine success or failure
    #[error("aborting the run: {0}")]
    Abort(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Construct a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Construct a configuration error for a missing required field
    pub fn missing_config(field: &str) -> Self {
        Error::Config(format!("missing required field: {field}"))
    }

    /// Construct a launch error
    pub fn launch(msg: impl Into<String>) -> Self {
        Error::Launch(msg.into())
    }

    /// Construct a fatal abort error
    pub fn abort(msg: impl Into<String>) -> Self {
        Error::Abort(msg.into())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
