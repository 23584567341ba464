//! Error types for the harness.

use std::path::PathBuf;

use stencil_runner::RunnerError;
use stencil_templates::TemplateError;
use thiserror::Error;

/// Result type alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while generating or validating templates.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Template error: {0}")]
    Render(#[from] TemplateError),

    #[error("{template}: step '{step}' failed: {command} ({detail})")]
    CommandFailed {
        template: String,
        step: String,
        command: String,
        /// Exit code, if the command ran to completion
        code: Option<i32>,
        detail: String,
    },

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
