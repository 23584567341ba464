//! # stencil_core
//!
//! Validation orchestration for stencil.
//!
//! This crate turns the template catalog into runs: every selected template
//! is rendered first, then its validation sequence is executed step by step
//! and classified into a [`RunReport`].
//!
//! # Architecture
//!
//! - **Steps**: A command or a server probe with a failure policy
//! - **Sequences**: The ordered steps of each template
//! - **Executor**: Runs one sequence through a `StepRunner`
//! - **Harness**: The generate, validate, clean and show operations
//!
//! # Example
//!
//! ```rust,no_run
//! use stencil_core::{Harness, HarnessConfig, ValidateOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarnessConfig::load(None)?;
//!     let harness = Harness::from_config(&config)?;
//!
//!     let run = harness.validate(Some("cli"), ValidateOptions::default()).await?;
//!     print!("{}", run.report.render_text());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod harness;
pub mod report;
pub mod sequence;
pub mod step;

pub use config::{HarnessConfig, ProbeSettings, CONFIG_FILE};
pub use error::{HarnessError, HarnessResult};
pub use executor::StepExecutor;
pub use harness::{Harness, UsageHint, ValidateOptions, ValidationRun};
pub use report::{OutcomeStatus, RunReport, StepOutcome};
pub use sequence::validation_sequence;
pub use step::{FailurePolicy, StepKind, ValidationStep};
