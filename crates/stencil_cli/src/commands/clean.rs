//! Clean command - Remove the output directory.

use anyhow::{Context, Result};

use stencil_core::Harness;

pub fn execute(harness: &Harness) -> Result<()> {
    let root = harness.output_root().display().to_string();

    if harness.clean().context("Failed to clean output directory")? {
        println!("🧹 Removed {}", root);
    } else {
        println!("Nothing to clean at {}", root);
    }

    Ok(())
}
