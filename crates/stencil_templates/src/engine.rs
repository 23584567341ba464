//! Rendering engines.
//!
//! The harness treats the template engine as an opaque collaborator: given a
//! source directory, an output root and a set of variables it materializes a
//! project tree under the output root. `cookiecutter` is the default engine;
//! [`BuiltinEngine`](crate::builtin::BuiltinEngine) renders in-process for
//! hosts without it.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builtin::BuiltinEngine;
use crate::error::{TemplateError, TemplateResult};

/// A template rendering engine.
pub trait RenderEngine: Send + Sync {
    /// Engine name used in logs and errors.
    fn name(&self) -> &str;

    /// Render the template at `source_dir` into `output_root`.
    fn render(
        &self,
        source_dir: &Path,
        output_root: &Path,
        variables: &BTreeMap<String, String>,
    ) -> TemplateResult<()>;
}

/// Which engine to render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Cookiecutter,
    Builtin,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cookiecutter => "cookiecutter",
            Self::Builtin => "builtin",
        }
    }

    /// Construct the engine. `cookiecutter_bin` is only used by the
    /// cookiecutter engine.
    pub fn build(&self, cookiecutter_bin: &Path) -> Box<dyn RenderEngine> {
        match self {
            Self::Cookiecutter => Box::new(CookiecutterEngine::new(cookiecutter_bin)),
            Self::Builtin => Box::new(BuiltinEngine::new()),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cookiecutter" => Ok(Self::Cookiecutter),
            "builtin" => Ok(Self::Builtin),
            other => Err(format!(
                "unknown engine '{}' (expected cookiecutter or builtin)",
                other
            )),
        }
    }
}

/// Shells out to the `cookiecutter` executable.
#[derive(Debug, Clone)]
pub struct CookiecutterEngine {
    program: PathBuf,
}

impl Default for CookiecutterEngine {
    fn default() -> Self {
        Self::new("cookiecutter")
    }
}

impl CookiecutterEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build the argument list for one render.
    pub fn build_args(
        &self,
        source_dir: &Path,
        output_root: &Path,
        variables: &BTreeMap<String, String>,
    ) -> Vec<String> {
        let mut args = vec![
            source_dir.to_string_lossy().to_string(),
            "--no-input".to_string(),
            "--output-dir".to_string(),
            output_root.to_string_lossy().to_string(),
        ];
        for (key, value) in variables {
            args.push(format!("{}={}", key, value));
        }
        args
    }
}

impl RenderEngine for CookiecutterEngine {
    fn name(&self) -> &str {
        "cookiecutter"
    }

    fn render(
        &self,
        source_dir: &Path,
        output_root: &Path,
        variables: &BTreeMap<String, String>,
    ) -> TemplateResult<()> {
        let args = self.build_args(source_dir, output_root, variables);
        debug!("Executing: {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => TemplateError::EngineUnavailable {
                    engine: self.name().to_string(),
                    message: format!("{} not found on PATH", self.program.display()),
                },
                _ => TemplateError::Io(e),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(TemplateError::EngineFailed {
                engine: self.name().to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
