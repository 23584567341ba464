//! Step executor.
//!
//! Runs a template's validation sequence in order, classifies each step
//! and records it in the report. The first required step that fails stops
//! the sequence.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use stencil_runner::{ExecutionResult, RunnerError, StepRunner};
use tracing::{debug, error, info, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::report::{OutcomeStatus, RunReport, StepOutcome};
use crate::step::{StepKind, ValidationStep};

/// Executes validation sequences through a [`StepRunner`].
#[derive(Clone)]
pub struct StepExecutor {
    runner: Arc<dyn StepRunner>,
}

impl StepExecutor {
    pub fn new(runner: Arc<dyn StepRunner>) -> Self {
        Self { runner }
    }

    /// Run `steps` for `template` inside `project_dir`.
    ///
    /// Every executed step is recorded in `report`. Returns
    /// [`HarnessError::CommandFailed`] when a required step fails; later
    /// steps are not run.
    pub async fn execute(
        &self,
        template: &str,
        project_dir: &Path,
        steps: &[ValidationStep],
        report: &mut RunReport,
    ) -> HarnessResult<()> {
        info!("Validating {} ({} steps)", template, steps.len());

        for step in steps {
            let step = step.in_dir(project_dir);
            let started = Instant::now();
            let (status, message, failure) = self.run_step(template, &step).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            report.push(
                StepOutcome::new(template, &step.name, status, message).with_duration(duration_ms),
            );

            if let Some(err) = failure {
                error!("{}", err);
                return Err(err);
            }
        }

        info!("{} validated", template);
        Ok(())
    }

    async fn run_step(
        &self,
        template: &str,
        step: &ValidationStep,
    ) -> (OutcomeStatus, String, Option<HarnessError>) {
        match &step.kind {
            StepKind::Command(spec) => {
                let outcome = self.runner.run(spec).await;
                self.classify_command(template, step, outcome)
            }
            StepKind::Probe(spec) => match self.runner.probe(spec).await {
                Ok(result) if result.healthy => (OutcomeStatus::Success, result.detail, None),
                Ok(result) => {
                    warn!("Health check failed for {}: {}", template, result.detail);
                    (OutcomeStatus::Warning, result.detail, None)
                }
                Err(e) => {
                    warn!("Could not probe {}: {}", template, e);
                    (OutcomeStatus::Warning, e.to_string(), None)
                }
            },
        }
    }

    fn classify_command(
        &self,
        template: &str,
        step: &ValidationStep,
        outcome: Result<ExecutionResult, RunnerError>,
    ) -> (OutcomeStatus, String, Option<HarnessError>) {
        let (code, detail) = match outcome {
            Ok(result) if result.success() => {
                return (OutcomeStatus::Success, "passed".to_string(), None);
            }
            Ok(result) => {
                let output = result.combined_output();
                if !output.is_empty() {
                    debug!("Output of {}:\n{}", result.command, output);
                }
                (Some(result.exit_code), format!("exit code {}", result.exit_code))
            }
            Err(e) => (None, e.to_string()),
        };

        if step.is_required() {
            let failure = HarnessError::CommandFailed {
                template: template.to_string(),
                step: step.name.clone(),
                command: step.command_line(),
                code,
                detail: detail.clone(),
            };
            (OutcomeStatus::Failure, detail, Some(failure))
        } else {
            let message = match &step.note {
                Some(note) => format!("{} ({})", note, detail),
                None => detail,
            };
            warn!("{} {}: {}", template, step.name, message);
            (OutcomeStatus::Warning, message, None)
        }
    }
}
