//! stencil CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Validation failure
//! - 4: Template error

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};
use stencil_core::HarnessError;
use stencil_templates::TemplateError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TEMPLATE_ERROR: u8 = 4;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are reported through clap errors too
            return if e.use_stderr() {
                ExitCode::from(ExitCodes::INVALID_ARGS)
            } else {
                ExitCode::from(ExitCodes::SUCCESS)
            };
        }
    };

    // Initialize logging; RUST_LOG takes precedence over -v/-q
    let default_filter = if cli.verbose {
        "info,stencil=debug"
    } else if cli.quiet {
        "warn"
    } else {
        "warn,stencil=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    match run(cli).await {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let harness = cli.harness()?;

    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args, &harness),
        Commands::Validate(args) => {
            // Dropping the validation future stops any running step
            tokio::select! {
                result = commands::validate::execute(args, &harness) => result,
                _ = tokio::signal::ctrl_c() => anyhow::bail!("Validation interrupted"),
            }
        }
        Commands::Clean => commands::clean::execute(&harness),
        Commands::Show => commands::show::execute(&harness),
    }
}

/// Map the root cause of an error to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<HarnessError>() {
            return match err {
                HarnessError::CommandFailed { .. } => ExitCodes::VALIDATION_FAILURE,
                HarnessError::Render(_) => ExitCodes::TEMPLATE_ERROR,
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if cause.downcast_ref::<TemplateError>().is_some() {
            return ExitCodes::TEMPLATE_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}
