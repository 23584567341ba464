//! Validation sequences per template.

use stencil_runner::CommandSpec;
use stencil_templates::TemplateDescriptor;
use tracing::warn;

use crate::config::ProbeSettings;
use crate::step::ValidationStep;

pub const GO_SERVER_PORT: u16 = 18080;
pub const PYTHON_SERVER_PORT: u16 = 18000;
pub const BAYESIAN_SERVER_PORT: u16 = 18001;

/// The ordered validation steps of a template.
pub fn validation_sequence(
    template: &TemplateDescriptor,
    probe: &ProbeSettings,
) -> Vec<ValidationStep> {
    let name = template.project_slug();
    match template.key {
        "go" => vec![
            ValidationStep::command("make help"),
            ValidationStep::command("go mod tidy"),
            ValidationStep::command("make build"),
            ValidationStep::command(&format!("./bin/{} --help", name)),
            ValidationStep::command("make test")
                .tolerated("may need database")
                .captured(),
            ValidationStep::probe(probe.spec(
                template.key,
                CommandSpec::parse(&format!(
                    "./bin/{} server --addr :{}",
                    name, GO_SERVER_PORT
                )),
                GO_SERVER_PORT,
            )),
        ],
        "python" => vec![
            ValidationStep::command("make help"),
            ValidationStep::command("uv sync --all-extras"),
            ValidationStep::command(&format!("uv run {} --help", name)),
            ValidationStep::command("make test"),
            ValidationStep::command("make lint"),
            ValidationStep::probe(probe.spec(
                template.key,
                uvicorn("server.main:app", PYTHON_SERVER_PORT),
                PYTHON_SERVER_PORT,
            )),
        ],
        "cli" => vec![
            ValidationStep::command("make help"),
            ValidationStep::command("./simple.py --help"),
            ValidationStep::command("./simple.py hello --name World"),
            ValidationStep::command("./simple.py add 2 3"),
            ValidationStep::command("uv sync --all-extras"),
            ValidationStep::command(&format!("uv run {} --help", name)),
            ValidationStep::command(&format!("uv run {} hello --name World", name)),
            ValidationStep::command(&format!("uv run {} foo do-something --verbose", name)),
            ValidationStep::command(&format!("uv run {} bar greet World --count 2", name)),
            ValidationStep::command("make test"),
            ValidationStep::command("make lint"),
        ],
        "bayesian" => vec![
            ValidationStep::command("make help"),
            ValidationStep::command("uv sync --all-extras"),
            ValidationStep::command(&format!("uv run {} --help", name)),
            ValidationStep::command(&format!("uv run {} experiments --help", name)),
            ValidationStep::command("make test"),
            ValidationStep::command("make lint"),
            ValidationStep::probe(probe.spec(
                template.key,
                uvicorn(
                    &format!("{}.server.main:app", template.package_name()),
                    BAYESIAN_SERVER_PORT,
                ),
                BAYESIAN_SERVER_PORT,
            )),
        ],
        other => {
            warn!("No validation sequence defined for template {}", other);
            Vec::new()
        }
    }
}

fn uvicorn(app: &str, port: u16) -> CommandSpec {
    CommandSpec::parse(&format!(
        "uv run uvicorn {} --host 0.0.0.0 --port {}",
        app, port
    ))
}
