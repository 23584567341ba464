//! Template descriptors.
//!
//! Every template the harness knows about is a compile-time constant: the
//! source directory it lives in, the directory it renders to and the
//! variables passed to the engine. Nothing here is user-configurable.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{TemplateError, TemplateResult};

/// Identifies a template and the variables it is rendered with.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TemplateDescriptor {
    /// Short key used on the command line (`--only cli`)
    pub key: &'static str,
    /// Directory name under the templates root
    pub source: &'static str,
    /// Directory name the template renders to under the output root
    pub output: &'static str,
    /// Substitution variables handed to the engine
    pub variables: &'static [(&'static str, &'static str)],
    /// Entry points printed by `show`
    pub usage: &'static [&'static str],
}

impl TemplateDescriptor {
    /// Substitution variables as an owned map.
    pub fn variables(&self) -> BTreeMap<String, String> {
        self.variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Value of a single substitution variable.
    pub fn variable(&self, name: &str) -> Option<&'static str> {
        self.variables
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| *v)
    }

    /// The rendered project's slug. Equal to the output directory name, and
    /// the name of the executable or console script the project installs.
    pub fn project_slug(&self) -> &'static str {
        self.output
    }

    /// The rendered project's Python package name.
    pub fn package_name(&self) -> String {
        self.output.replace('-', "_")
    }
}

const AUTHOR: &str = "testuser";

const GO: TemplateDescriptor = TemplateDescriptor {
    key: "go",
    source: "go-service",
    output: "test-go-service",
    variables: &[("project_name", "Test Go Service"), ("author", AUTHOR)],
    usage: &[
        "make help          # Show targets",
        "make build         # Build binary",
        "make test          # Run tests",
        "make run-dev       # Run with hot reload",
        "./bin/<name> --help",
    ],
};

const PYTHON: TemplateDescriptor = TemplateDescriptor {
    key: "python",
    source: "python-service",
    output: "test-python-service",
    variables: &[("project_name", "Test Python Service"), ("author", AUTHOR)],
    usage: &[
        "make help          # Show targets",
        "uv sync --all-extras",
        "make test          # Run tests",
        "make run-dev       # Run with hot reload",
        "uv run <name> --help",
    ],
};

const CLI: TemplateDescriptor = TemplateDescriptor {
    key: "cli",
    source: "python-cli",
    output: "test-cli",
    variables: &[("project_name", "Test CLI"), ("author", AUTHOR)],
    usage: &[
        "./simple.py --help # PEP 723 script (no install)",
        "uv sync --all-extras",
        "uv run <name> --help",
        "uv run <name> foo do-something",
        "make test",
    ],
};

const BAYESIAN: TemplateDescriptor = TemplateDescriptor {
    key: "bayesian",
    source: "python-bayesian-experiment",
    output: "test-bayesian",
    variables: &[("project_name", "Test Bayesian"), ("author", AUTHOR)],
    usage: &[
        "make help          # Show targets",
        "uv sync --all-extras",
        "make run-server    # Run API server",
        "make run-mlflow    # Run MLflow UI",
        "make start-dev     # Start tmux dev session",
        "uv run <name> experiments list",
        "make test",
    ],
};

/// The fixed set of templates, in render/validate order.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<TemplateDescriptor>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateCatalog {
    /// Keys of the built-in templates, in catalog order.
    pub const KEYS: [&'static str; 4] = ["go", "python", "cli", "bayesian"];

    /// The built-in catalog.
    pub fn builtin() -> Self {
        Self {
            templates: vec![GO, PYTHON, CLI, BAYESIAN],
        }
    }

    /// Get a template by key.
    pub fn get(&self, key: &str) -> Option<&TemplateDescriptor> {
        self.templates.iter().find(|t| t.key == key)
    }

    /// List all templates in catalog order.
    pub fn list(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    /// Resolve an optional `--only` filter into the templates to process.
    pub fn select(&self, only: Option<&str>) -> TemplateResult<Vec<&TemplateDescriptor>> {
        match only {
            Some(key) => self
                .get(key)
                .map(|t| vec![t])
                .ok_or_else(|| TemplateError::NotFound(key.to_string())),
            None => Ok(self.templates.iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keys_match_descriptors() {
        let catalog = TemplateCatalog::builtin();
        let keys: Vec<_> = catalog.list().iter().map(|t| t.key).collect();
        assert_eq!(keys, TemplateCatalog::KEYS);
    }

    #[test]
    fn test_select_single() {
        let catalog = TemplateCatalog::builtin();
        let selected = catalog.select(Some("cli")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].source, "python-cli");
        assert_eq!(selected[0].output, "test-cli");
    }

    #[test]
    fn test_select_unknown() {
        let catalog = TemplateCatalog::builtin();
        let err = catalog.select(Some("rust")).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(key) if key == "rust"));
    }

    #[test]
    fn test_names() {
        let catalog = TemplateCatalog::builtin();
        let bayesian = catalog.get("bayesian").unwrap();
        assert_eq!(bayesian.project_slug(), "test-bayesian");
        assert_eq!(bayesian.package_name(), "test_bayesian");
        assert_eq!(bayesian.variable("project_name"), Some("Test Bayesian"));
        assert_eq!(bayesian.variable("author"), Some("testuser"));
        assert_eq!(bayesian.variables().len(), 2);
    }
}
