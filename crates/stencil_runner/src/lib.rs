//! # stencil_runner
//!
//! Process execution for stencil validation steps.
//!
//! Validation steps are external commands run in a generated project, plus
//! short-lived server probes that start a server, hit its health endpoint
//! once and stop it again.
//!
//! # Features
//!
//! - **Shell Runner**: Runs commands directly, streaming or capturing output
//! - **Timeouts**: Optional per-command timeout
//! - **Dry-Run Mode**: Log commands without execution
//! - **Server Probes**: Background server guarded against leaks
//! - **Mock Runner**: For testing without Go or Python toolchains
//!
//! # Example
//!
//! ```rust,no_run
//! use stencil_runner::{CommandSpec, ShellRunner, ShellRunnerOptions, StepRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = ShellRunner::new(ShellRunnerOptions::default())?;
//!
//!     let step = CommandSpec::parse("make help").cwd("project-templates/_test-output/test-cli");
//!     let result = runner.run(&step).await?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;
pub mod mock;
pub mod probe;
pub mod runner;
pub mod shell;

pub use command::{CommandSpec, OutputMode};
pub use error::{RunnerError, RunnerResult};
pub use mock::{CallKind, CapturedCall, MockResponse, MockRunner};
pub use probe::{BackgroundProcess, ProbeResult, ProbeSpec, ServerProbe};
pub use runner::{ExecutionResult, StepRunner};
pub use shell::{ShellRunner, ShellRunnerOptions};
