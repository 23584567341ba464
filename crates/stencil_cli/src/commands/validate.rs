//! Validate command - Render templates and run their validation sequences.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use stencil_core::{Harness, ValidateOptions};
use stencil_templates::TemplateCatalog;

/// Report format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Only validate this template (validates all if not specified)
    #[arg(long, value_parser = TemplateCatalog::KEYS)]
    pub only: Option<String>,

    /// Continue with the next template after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

pub async fn execute(args: ValidateArgs, harness: &Harness) -> Result<()> {
    info!("Validating templates in {:?}", harness.output_root());

    let options = ValidateOptions {
        keep_going: args.keep_going,
    };
    let run = harness
        .validate(args.only.as_deref(), options)
        .await
        .context("Failed to generate templates")?;

    match args.format {
        ReportFormat::Text => {
            println!();
            print!("{}", run.report.render_text());
            if run.show_banner() {
                println!();
                println!("🎉 All validations passed!");
            }
        }
        ReportFormat::Json => {
            println!(
                "{}",
                run.report.to_json().context("Failed to serialize report")?
            );
        }
    }

    run.into_result().context("Validation failed")?;
    Ok(())
}
