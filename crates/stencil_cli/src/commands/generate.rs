//! Generate command - Render templates into the output directory.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use stencil_core::Harness;
use stencil_templates::TemplateCatalog;

#[derive(Args)]
pub struct GenerateArgs {
    /// Only render this template (renders all if not specified)
    #[arg(long, value_parser = TemplateCatalog::KEYS)]
    pub only: Option<String>,
}

pub fn execute(args: GenerateArgs, harness: &Harness) -> Result<()> {
    info!(
        "Generating templates into {:?} with the {} engine",
        harness.output_root(),
        harness.engine_name()
    );

    let dirs = harness
        .generate(args.only.as_deref())
        .context("Failed to generate templates")?;

    for dir in &dirs {
        println!("✅ Generated {}", dir.display());
    }
    println!();
    println!(
        "📁 {} template(s) in {}",
        dirs.len(),
        harness.output_root().display()
    );

    Ok(())
}
