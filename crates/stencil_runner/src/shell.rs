//! Process-based step runner.
//!
//! Runs each command directly (no shell) in the project directory, either
//! streaming its output to the console or capturing it.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::command::{CommandSpec, OutputMode};
use crate::error::{RunnerError, RunnerResult};
use crate::probe::{ProbeResult, ProbeSpec, ServerProbe};
use crate::runner::{ExecutionResult, StepRunner};

/// Shell runner options.
#[derive(Debug, Clone, Default)]
pub struct ShellRunnerOptions {
    /// Log commands without executing them
    pub dry_run: bool,
    /// Per-command timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
}

impl ShellRunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Runs commands as child processes of the harness.
pub struct ShellRunner {
    options: ShellRunnerOptions,
    probe: ServerProbe,
}

impl ShellRunner {
    pub fn new(options: ShellRunnerOptions) -> RunnerResult<Self> {
        Ok(Self {
            options,
            probe: ServerProbe::new()?,
        })
    }

    /// Check if dry-run mode is enabled.
    pub fn is_dry_run(&self) -> bool {
        self.options.dry_run
    }

    fn build_command(&self, spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(spec.resolved_program());
        cmd.args(&spec.args).envs(&spec.env).kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        match spec.output {
            OutputMode::Stream => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            OutputMode::Capture => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
            }
        }
        cmd
    }

    fn dry_run_result(&self, spec: &CommandSpec) -> ExecutionResult {
        let now = Utc::now();
        ExecutionResult {
            command: spec.to_string(),
            exit_code: 0,
            stdout: format!("[DRY-RUN] Command: {}", spec),
            stderr: String::new(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }
}

#[async_trait]
impl StepRunner for ShellRunner {
    async fn run(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        if spec.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }

        info!("==> {}", spec);
        if self.options.dry_run {
            info!("[DRY-RUN] Would execute: {}", spec);
            return Ok(self.dry_run_result(spec));
        }
        debug!("Working directory: {:?}", spec.cwd);

        let started_at = Utc::now();
        let child = self
            .build_command(spec)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                command: spec.to_string(),
                source,
            })?;

        // Dropping the wait future on timeout kills the child.
        let output = if self.options.timeout_seconds > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.options.timeout_seconds),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| RunnerError::Timeout {
                command: spec.to_string(),
                seconds: self.options.timeout_seconds,
            })??
        } else {
            child.wait_with_output().await?
        };

        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;
        let exit_code = output.status.code().unwrap_or(-1);

        if exit_code == 0 {
            debug!("{} completed in {}ms", spec, duration_ms);
        } else {
            error!(
                "{} failed with exit code {} after {}ms",
                spec, exit_code, duration_ms
            );
        }

        Ok(ExecutionResult {
            command: spec.to_string(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            started_at,
            finished_at,
            duration_ms,
        })
    }

    async fn probe(&self, spec: &ProbeSpec) -> RunnerResult<ProbeResult> {
        if self.options.dry_run {
            info!(
                "[DRY-RUN] Would start {} and check {}",
                spec.command,
                spec.url()
            );
            return Ok(ProbeResult::healthy(200));
        }
        self.probe.run(spec).await
    }
}
