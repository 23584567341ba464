//! Run reports.
//!
//! A report collects one outcome per executed step and is rendered once at
//! the end of a run. Reports live in memory only.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Warning,
    Failure,
}

impl OutcomeStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✅",
            Self::Warning => "⚠️ ",
            Self::Failure => "❌",
        }
    }
}

/// Outcome of one executed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Template key
    pub template: String,
    /// Step name
    pub step: String,
    pub status: OutcomeStatus,
    /// Human-readable message
    pub message: String,
    pub duration_ms: u64,
}

impl StepOutcome {
    pub fn new(
        template: impl Into<String>,
        step: impl Into<String>,
        status: OutcomeStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            step: step.into(),
            status,
            message: message.into(),
            duration_ms: 0,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Ordered outcomes of one harness invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<StepOutcome>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: StepOutcome) {
        self.outcomes.push(outcome);
    }

    /// Outcomes recorded for one template.
    pub fn for_template<'a>(&'a self, template: &'a str) -> impl Iterator<Item = &'a StepOutcome> + 'a {
        self.outcomes.iter().filter(move |o| o.template == template)
    }

    /// Outcome of a named step of a template.
    pub fn outcome<'a>(&'a self, template: &'a str, step: &str) -> Option<&'a StepOutcome> {
        self.for_template(template).find(|o| o.step == step)
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.count(OutcomeStatus::Failure) > 0
    }

    /// Template keys in the order they first appear.
    pub fn templates(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for outcome in &self.outcomes {
            if !keys.contains(&outcome.template.as_str()) {
                keys.push(&outcome.template);
            }
        }
        keys
    }

    /// Render the report for the console.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for template in self.templates() {
            let _ = writeln!(out, "📦 {}", template);
            for outcome in self.for_template(template) {
                let _ = write!(out, "   {} {}", outcome.status.icon(), outcome.step);
                if outcome.status != OutcomeStatus::Success && !outcome.message.is_empty() {
                    let _ = write!(out, " - {}", outcome.message);
                }
                out.push('\n');
            }
        }
        let _ = writeln!(
            out,
            "\nResults: {} passed, {} warnings, {} failed",
            self.count(OutcomeStatus::Success),
            self.count(OutcomeStatus::Warning),
            self.count(OutcomeStatus::Failure)
        );
        out
    }

    /// Render the report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
