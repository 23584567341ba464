//! Step runner trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::command::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::probe::{ProbeResult, ProbeSpec};

/// Result of running one command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The command line that ran
    pub command: String,
    /// Exit code (-1 when terminated by a signal)
    pub exit_code: i32,
    /// Captured stdout (empty when streamed)
    pub stdout: String,
    /// Captured stderr (empty when streamed)
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs validation commands and server probes.
///
/// Every command is attempted exactly once.
#[async_trait]
pub trait StepRunner: Send + Sync {
    /// Run a command and return its result whatever the exit code.
    async fn run(&self, command: &CommandSpec) -> RunnerResult<ExecutionResult>;

    /// Run a command and fail with [`RunnerError::CommandFailed`] on a
    /// non-zero exit.
    async fn run_checked(&self, command: &CommandSpec) -> RunnerResult<ExecutionResult> {
        let result = self.run(command).await?;
        if result.success() {
            Ok(result)
        } else {
            Err(RunnerError::CommandFailed {
                command: command.to_string(),
                code: result.exit_code,
            })
        }
    }

    /// Start a server in the background, check its health endpoint once and
    /// stop it again.
    async fn probe(&self, probe: &ProbeSpec) -> RunnerResult<ProbeResult>;
}
