//! CLI command definitions.
//!
//! This module defines the command structure for the stencil CLI. Global
//! flags are layered over `stencil.toml` to build the harness every
//! subcommand runs against.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use stencil_core::{Harness, HarnessConfig};
use stencil_templates::EngineKind;

pub mod clean;
pub mod generate;
pub mod show;
pub mod validate;

/// stencil - project template harness
#[derive(Parser)]
#[command(name = "stencil")]
#[command(version, about = "stencil - render project templates and validate the result")]
#[command(long_about = r#"
stencil renders the project templates (Go service, Python service, Python
CLI, Bayesian experiment) into an output directory and checks that each
generated project builds, tests, lints and serves its health endpoint.

COMMANDS:
  generate  → Render templates into the output directory
  validate  → Render templates, then run each validation sequence
  clean     → Remove the output directory
  show      → Print usage hints for the generated projects

CONFIGURATION:
  Defaults < stencil.toml < environment < flags

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Template error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to ./stencil.toml when present)
    #[arg(long, global = true, env = "STENCIL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the template sources
    #[arg(long, global = true, env = "STENCIL_TEMPLATES_DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Output directory for generated projects
    #[arg(long, global = true, env = "STENCIL_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Rendering engine (cookiecutter or builtin)
    #[arg(long, global = true, env = "STENCIL_ENGINE")]
    pub engine: Option<EngineKind>,

    /// Print validation commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render templates into the output directory
    Generate(generate::GenerateArgs),

    /// Render templates and run their validation sequences
    Validate(validate::ValidateArgs),

    /// Remove the output directory
    Clean,

    /// Print usage hints for the generated projects
    Show,
}

impl Cli {
    /// Load the configuration file and apply command line overrides.
    pub fn config(&self) -> Result<HarnessConfig> {
        let mut config =
            HarnessConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(dir) = &self.templates_dir {
            config.templates_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(engine) = self.engine {
            config.engine = engine;
        }
        if self.dry_run {
            config.dry_run = true;
        }

        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Build the harness for the effective configuration.
    pub fn harness(&self) -> Result<Harness> {
        let config = self.config()?;
        Harness::from_config(&config).context("Failed to create harness")
    }
}
