//! Error types for templates.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while rendering a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template source directory does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("Template engine {engine} is not available: {message}")]
    EngineUnavailable { engine: String, message: String },

    #[error("Template engine {engine} exited with code {code}: {stderr}")]
    EngineFailed {
        engine: String,
        code: i32,
        stderr: String,
    },

    #[error("Template rendering produced no files in {0}")]
    EmptyRender(PathBuf),

    #[error("Invalid cookiecutter context in {path}: {message}")]
    InvalidContext { path: PathBuf, message: String },

    #[error("Template rendering failed: {0}")]
    RenderingFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
