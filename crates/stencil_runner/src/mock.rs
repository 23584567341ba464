//! Mock step runner for testing.
//!
//! Provides a scripted implementation of the [`StepRunner`] trait so the
//! orchestrator can be exercised without a Go or Python toolchain.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::command::CommandSpec;
use crate::error::{RunnerError, RunnerResult};
use crate::probe::{ProbeResult, ProbeSpec};
use crate::runner::{ExecutionResult, StepRunner};

/// Predefined mock response for a command.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Kind of call captured by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Run,
    Probe,
}

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub kind: CallKind,
    /// Command line as displayed
    pub command: String,
    pub cwd: Option<PathBuf>,
    /// Probed URL, for probe calls
    pub url: Option<String>,
}

/// Mock step runner for testing.
///
/// Responses are keyed by the displayed command line. Commands without a
/// scripted response get the default response (success unless changed).
#[derive(Clone)]
pub struct MockRunner {
    responses: Arc<RwLock<HashMap<String, MockResponse>>>,
    default_response: Arc<RwLock<MockResponse>>,
    probe_results: Arc<RwLock<HashMap<u16, ProbeResult>>>,
    spawn_failures: Arc<RwLock<Vec<String>>>,
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a mock runner on which every command succeeds.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            default_response: Arc::new(RwLock::new(MockResponse::success(""))),
            probe_results: Arc::new(RwLock::new(HashMap::new())),
            spawn_failures: Arc::new(RwLock::new(Vec::new())),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Script the response for a command line.
    pub fn respond_to(self, command: impl Into<String>, response: MockResponse) -> Self {
        self.responses.write().insert(command.into(), response);
        self
    }

    /// Response for commands without a scripted one.
    pub fn default_response(self, response: MockResponse) -> Self {
        *self.default_response.write() = response;
        self
    }

    /// Script the probe result for a port. Unscripted probes are healthy.
    pub fn probe_result(self, port: u16, result: ProbeResult) -> Self {
        self.probe_results.write().insert(port, result);
        self
    }

    /// Make the given program fail to spawn, as if it were not installed.
    pub fn missing_program(self, program: impl Into<String>) -> Self {
        self.spawn_failures.write().push(program.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Command lines of all captured calls, in order.
    pub fn commands(&self) -> Vec<String> {
        self.captured_calls
            .read()
            .iter()
            .map(|c| c.command.clone())
            .collect()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a command line was run or probed.
    pub fn was_called(&self, command: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.command == command)
    }

    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    fn check_spawn(&self, spec: &CommandSpec) -> RunnerResult<()> {
        if self.spawn_failures.read().contains(&spec.program) {
            return Err(RunnerError::Spawn {
                command: spec.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{}: not found", spec.program),
                ),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StepRunner for MockRunner {
    async fn run(&self, spec: &CommandSpec) -> RunnerResult<ExecutionResult> {
        if spec.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }

        let command = spec.to_string();
        self.record_call(CapturedCall {
            kind: CallKind::Run,
            command: command.clone(),
            cwd: spec.cwd.clone(),
            url: None,
        });
        self.check_spawn(spec)?;

        let response = self
            .responses
            .read()
            .get(&command)
            .cloned()
            .unwrap_or_else(|| self.default_response.read().clone());

        let now = Utc::now();
        Ok(ExecutionResult {
            command,
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at: now,
            finished_at: now,
            duration_ms: response.duration_ms,
        })
    }

    async fn probe(&self, spec: &ProbeSpec) -> RunnerResult<ProbeResult> {
        self.record_call(CapturedCall {
            kind: CallKind::Probe,
            command: spec.command.to_string(),
            cwd: spec.command.cwd.clone(),
            url: Some(spec.url()),
        });
        self.check_spawn(&spec.command)?;

        Ok(self
            .probe_results
            .read()
            .get(&spec.port)
            .cloned()
            .unwrap_or_else(|| ProbeResult::healthy(200)))
    }
}
