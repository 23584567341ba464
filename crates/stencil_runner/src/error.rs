//! Error types for the runner module.

use thiserror::Error;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while running commands and probes.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Command failed: {command} (exit code {code})")]
    CommandFailed { command: String, code: i32 },

    #[error("Command timed out after {seconds} seconds: {command}")]
    Timeout { command: String, seconds: u64 },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
