//! Validation steps.

use std::path::Path;

use stencil_runner::{CommandSpec, OutputMode, ProbeSpec};

/// What happens when a step does not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Failure aborts the template and fails the run
    Required,
    /// Failure is recorded as a warning
    Tolerated,
}

/// What a step does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Run a command in the foreground
    Command(CommandSpec),
    /// Start a server, check its health endpoint, stop it
    Probe(ProbeSpec),
}

/// One step of a template's validation sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationStep {
    pub name: String,
    pub kind: StepKind,
    pub policy: FailurePolicy,
    /// Shown with the warning when a tolerated step fails
    pub note: Option<String>,
}

impl ValidationStep {
    /// A required command, named after its command line.
    pub fn command(line: &str) -> Self {
        let spec = CommandSpec::parse(line);
        Self {
            name: spec.to_string(),
            kind: StepKind::Command(spec),
            policy: FailurePolicy::Required,
            note: None,
        }
    }

    /// A server probe. Probes are always tolerated.
    pub fn probe(spec: ProbeSpec) -> Self {
        Self {
            name: format!("probe {}", spec.url()),
            kind: StepKind::Probe(spec),
            policy: FailurePolicy::Tolerated,
            note: None,
        }
    }

    /// Downgrade failures of this step to warnings.
    pub fn tolerated(mut self, note: impl Into<String>) -> Self {
        self.policy = FailurePolicy::Tolerated;
        self.note = Some(note.into());
        self
    }

    /// Capture the command's output instead of streaming it.
    pub fn captured(mut self) -> Self {
        if let StepKind::Command(spec) = &mut self.kind {
            spec.output = OutputMode::Capture;
        }
        self
    }

    pub fn is_required(&self) -> bool {
        self.policy == FailurePolicy::Required
    }

    /// The command line this step runs.
    pub fn command_line(&self) -> String {
        match &self.kind {
            StepKind::Command(spec) => spec.to_string(),
            StepKind::Probe(spec) => spec.command.to_string(),
        }
    }

    /// A copy of the step that runs inside `dir`.
    pub fn in_dir(&self, dir: &Path) -> Self {
        let kind = match &self.kind {
            StepKind::Command(spec) => StepKind::Command(spec.clone().cwd(dir)),
            StepKind::Probe(spec) => {
                let mut spec = spec.clone();
                spec.command = spec.command.cwd(dir);
                StepKind::Probe(spec)
            }
        };
        Self {
            kind,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_command_step() {
        let step = ValidationStep::command("uv sync --all-extras");
        assert_eq!(step.name, "uv sync --all-extras");
        assert!(step.is_required());
        assert!(step.note.is_none());
    }

    #[test]
    fn test_tolerated_captured() {
        let step = ValidationStep::command("make test")
            .tolerated("may need database")
            .captured();

        assert!(!step.is_required());
        assert_eq!(step.note.as_deref(), Some("may need database"));
        match step.kind {
            StepKind::Command(spec) => assert_eq!(spec.output, OutputMode::Capture),
            StepKind::Probe(_) => panic!("expected a command"),
        }
    }

    #[test]
    fn test_probe_is_tolerated() {
        let step = ValidationStep::probe(ProbeSpec::new(CommandSpec::parse("./bin/svc server"), 18080));
        assert!(!step.is_required());
        assert_eq!(step.command_line(), "./bin/svc server");
        assert_eq!(step.name, "probe http://localhost:18080/healthz");
    }

    #[test]
    fn test_in_dir() {
        let dir = PathBuf::from("/out/test-cli");
        let step = ValidationStep::command("./simple.py --help").in_dir(&dir);
        match &step.kind {
            StepKind::Command(spec) => assert_eq!(spec.cwd.as_deref(), Some(dir.as_path())),
            StepKind::Probe(_) => panic!("expected a command"),
        }

        let probe = ValidationStep::probe(ProbeSpec::new(CommandSpec::parse("uv run uvicorn"), 1))
            .in_dir(&dir);
        match &probe.kind {
            StepKind::Probe(spec) => assert_eq!(spec.command.cwd.as_deref(), Some(dir.as_path())),
            StepKind::Command(_) => panic!("expected a probe"),
        }
    }
}
