//! Harness configuration.
//!
//! Built-in defaults are overlaid by an optional `stencil.toml`. Command line
//! flags are applied on top by the binary.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stencil_runner::{CommandSpec, ProbeSpec};
use stencil_templates::EngineKind;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "stencil.toml";

/// Directory name of the output root under the templates directory.
pub const DEFAULT_OUTPUT_DIR: &str = "_test-output";

/// Top-level harness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Directory holding the template sources
    pub templates_dir: PathBuf,
    /// Output root; `<templates_dir>/_test-output` when unset
    pub output_dir: Option<PathBuf>,
    /// Rendering engine
    pub engine: EngineKind,
    /// cookiecutter executable
    pub cookiecutter_bin: PathBuf,
    /// Per-command timeout in seconds (0 = none)
    pub command_timeout_secs: u64,
    /// Log validation commands without running them
    pub dry_run: bool,
    /// Server probe settings
    pub probe: ProbeSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("project-templates"),
            output_dir: None,
            engine: EngineKind::default(),
            cookiecutter_bin: PathBuf::from("cookiecutter"),
            command_timeout_secs: 0,
            dry_run: false,
            probe: ProbeSettings::default(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `./stencil.toml` is read if
    /// present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> HarnessResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let local = Path::new(CONFIG_FILE);
                if local.is_file() {
                    Self::from_file(local)
                } else {
                    debug!("No {} found, using defaults", CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read a configuration file.
    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("Loaded configuration from {:?}", path);
        Self::from_toml_str(&content).map_err(|message| HarnessError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse configuration from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// The resolved output root.
    pub fn output_root(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.templates_dir.join(DEFAULT_OUTPUT_DIR))
    }
}

/// Server probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeSettings {
    /// Host health requests are sent to
    pub host: String,
    /// Health endpoint path
    pub health_path: String,
    /// Health request timeout in seconds
    pub request_timeout_secs: u64,
    /// Seconds a server gets to exit after SIGTERM
    pub shutdown_grace_secs: u64,
    /// Startup grace overrides in milliseconds, by template key
    pub grace_ms: BTreeMap<String, u64>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            health_path: "/healthz".to_string(),
            request_timeout_secs: 5,
            shutdown_grace_secs: 5,
            grace_ms: BTreeMap::new(),
        }
    }
}

impl ProbeSettings {
    /// Startup grace for a template's server.
    pub fn grace_for(&self, key: &str) -> Duration {
        let ms = self
            .grace_ms
            .get(key)
            .copied()
            .unwrap_or_else(|| default_grace_ms(key));
        Duration::from_millis(ms)
    }

    /// Build the probe of a template's server.
    pub fn spec(&self, key: &str, command: CommandSpec, port: u16) -> ProbeSpec {
        ProbeSpec::new(command, port)
            .host(self.host.clone())
            .path(self.health_path.clone())
            .grace(self.grace_for(key))
            .request_timeout(Duration::from_secs(self.request_timeout_secs))
            .shutdown_grace(Duration::from_secs(self.shutdown_grace_secs))
    }
}

fn default_grace_ms(key: &str) -> u64 {
    match key {
        "go" => 1500,
        "python" => 2500,
        "bayesian" => 3000,
        _ => 2000,
    }
}
