//! Error types for executor configuration and unit launches.

use std::time::Duration;
use thiserror::Error;

/// Invalid executor configuration, reported at startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_workers must be at least 1")]
    ZeroWorkers,

    #[error("interpreter program must not be empty")]
    EmptyInterpreter,
}

/// Why a unit produced no exit status.
///
/// Never returned to callers: the launcher renders it into the unit's
/// `ExecutionResult::error`.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to capture output: {0}")]
    Capture(#[source] std::io::Error),

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}
