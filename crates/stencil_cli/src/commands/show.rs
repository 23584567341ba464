//! Show command - Print usage hints for the generated projects.

use anyhow::Result;

use stencil_core::Harness;

pub fn execute(harness: &Harness) -> Result<()> {
    println!("📋 Generated projects in {}\n", harness.output_root().display());

    for hint in harness.show() {
        let status = if hint.path.is_dir() { "" } else { " (not generated)" };
        println!("{}{}:", hint.key, status);
        println!("  cd {}", hint.path.display());
        for line in &hint.lines {
            println!("  {}", line);
        }
        println!();
    }

    Ok(())
}
