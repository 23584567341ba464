//! The template harness.
//!
//! Ties the catalog, the renderer and the step executor together into the
//! four user-facing operations: generate, validate, clean and show.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stencil_runner::{ShellRunner, ShellRunnerOptions, StepRunner};
use stencil_templates::{TemplateCatalog, TemplateDescriptor, TemplateRenderer};
use tracing::info;

use crate::config::{HarnessConfig, ProbeSettings};
use crate::error::{HarnessError, HarnessResult};
use crate::executor::StepExecutor;
use crate::report::RunReport;
use crate::sequence::validation_sequence;

/// Options for [`Harness::validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions {
    /// Continue with the next template after a required step fails
    pub keep_going: bool,
}

/// Result of a validation run.
#[derive(Debug)]
pub struct ValidationRun {
    pub report: RunReport,
    /// Number of templates whose sequence was started
    pub templates_validated: usize,
    /// Required-step failures, at most one per template
    pub failures: Vec<HarnessError>,
}

impl ValidationRun {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether to print the closing "all passed" banner: only for
    /// multi-template runs without failures.
    pub fn show_banner(&self) -> bool {
        self.templates_validated > 1 && self.passed()
    }

    /// The first failure as an error, or the report.
    pub fn into_result(mut self) -> HarnessResult<RunReport> {
        if self.failures.is_empty() {
            Ok(self.report)
        } else {
            Err(self.failures.remove(0))
        }
    }
}

/// Usage hints for one template.
#[derive(Debug, Clone)]
pub struct UsageHint {
    pub key: &'static str,
    pub path: PathBuf,
    pub lines: Vec<String>,
}

/// Generates and validates the catalog's templates.
pub struct Harness {
    catalog: TemplateCatalog,
    renderer: TemplateRenderer,
    executor: StepExecutor,
    probe: ProbeSettings,
}

impl Harness {
    /// Build a harness from configuration.
    pub fn new(config: &HarnessConfig, runner: Arc<dyn StepRunner>) -> Self {
        let renderer = TemplateRenderer::new(
            &config.templates_dir,
            config.output_root(),
            config.engine.build(&config.cookiecutter_bin),
        );
        Self::with_renderer(renderer, runner, config.probe.clone())
    }

    /// Build a harness that runs steps as child processes.
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let mut options = ShellRunnerOptions::new().timeout(config.command_timeout_secs);
        if config.dry_run {
            options = options.dry_run();
        }
        let runner = ShellRunner::new(options)?;
        Ok(Self::new(config, Arc::new(runner)))
    }

    pub fn with_renderer(
        renderer: TemplateRenderer,
        runner: Arc<dyn StepRunner>,
        probe: ProbeSettings,
    ) -> Self {
        Self {
            catalog: TemplateCatalog::builtin(),
            renderer,
            executor: StepExecutor::new(runner),
            probe,
        }
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn output_root(&self) -> &Path {
        self.renderer.output_root()
    }

    pub fn engine_name(&self) -> &str {
        self.renderer.engine_name()
    }

    /// Render the selected templates in catalog order. Stops at the first
    /// template that fails to render.
    pub fn generate(&self, only: Option<&str>) -> HarnessResult<Vec<PathBuf>> {
        let templates = self.catalog.select(only)?;
        self.render_all(&templates)
    }

    /// Render the selected templates, then run their validation sequences.
    ///
    /// Render errors are returned immediately and no step runs. Required
    /// step failures are collected in the returned [`ValidationRun`]; the
    /// run stops at the first one unless `keep_going` is set.
    pub async fn validate(
        &self,
        only: Option<&str>,
        options: ValidateOptions,
    ) -> HarnessResult<ValidationRun> {
        let templates = self.catalog.select(only)?;
        let project_dirs = self.render_all(&templates)?;

        let mut run = ValidationRun {
            report: RunReport::new(),
            templates_validated: 0,
            failures: Vec::new(),
        };

        for (template, project_dir) in templates.iter().zip(&project_dirs) {
            let steps = validation_sequence(template, &self.probe);
            run.templates_validated += 1;

            let result = self
                .executor
                .execute(template.key, project_dir, &steps, &mut run.report)
                .await;

            if let Err(err) = result {
                run.failures.push(err);
                if !options.keep_going {
                    break;
                }
            }
        }

        Ok(run)
    }

    /// Remove the output root. Returns whether there was anything to remove.
    pub fn clean(&self) -> HarnessResult<bool> {
        let root = self.renderer.output_root();
        match fs::remove_dir_all(root) {
            Ok(()) => {
                info!("Removed {:?}", root);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Nothing to clean at {:?}", root);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Usage hints for every template, pointing at its output directory.
    pub fn show(&self) -> Vec<UsageHint> {
        self.catalog
            .list()
            .iter()
            .map(|t| UsageHint {
                key: t.key,
                path: self.renderer.output_dir(t),
                lines: t
                    .usage
                    .iter()
                    .map(|line| line.replace("<name>", t.project_slug()))
                    .collect(),
            })
            .collect()
    }

    fn render_all(&self, templates: &[&TemplateDescriptor]) -> HarnessResult<Vec<PathBuf>> {
        templates
            .iter()
            .map(|t| self.renderer.render(t).map_err(HarnessError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stencil_runner::MockRunner;
    use stencil_templates::BuiltinEngine;
    use tempfile::tempdir;

    fn harness(root: &Path) -> Harness {
        let renderer = TemplateRenderer::new(
            root.join("templates"),
            root.join("out"),
            Box::new(BuiltinEngine::new()),
        );
        Harness::with_renderer(renderer, Arc::new(MockRunner::new()), ProbeSettings::default())
    }

    #[test]
    fn test_clean_is_idempotent() {
        let dir = tempdir().unwrap();
        let harness = harness(dir.path());
        fs::create_dir_all(dir.path().join("out/test-cli")).unwrap();

        assert!(harness.clean().unwrap());
        assert!(!dir.path().join("out").exists());
        assert!(!harness.clean().unwrap());
    }

    #[test]
    fn test_from_config() {
        let dir = tempdir().unwrap();
        let config = HarnessConfig {
            templates_dir: dir.path().join("templates"),
            output_dir: Some(dir.path().join("generated")),
            engine: stencil_templates::EngineKind::Builtin,
            dry_run: true,
            ..HarnessConfig::default()
        };

        let harness = Harness::from_config(&config).unwrap();
        assert_eq!(harness.engine_name(), "builtin");
        assert_eq!(harness.output_root(), dir.path().join("generated"));
    }

    #[test]
    fn test_show() {
        let dir = tempdir().unwrap();
        let hints = harness(dir.path()).show();

        assert_eq!(hints.len(), 4);
        assert_eq!(hints[2].key, "cli");
        assert_eq!(hints[2].path, dir.path().join("out/test-cli"));
        assert!(hints[2].lines.contains(&"uv run test-cli --help".to_string()));
        assert!(hints[0].lines.iter().any(|l| l == "./bin/test-go-service --help"));
    }

    #[test]
    fn test_generate_unknown_key() {
        let dir = tempdir().unwrap();
        let err = harness(dir.path()).generate(Some("rust")).unwrap_err();
        assert!(matches!(err, HarnessError::Render(_)));
    }

    #[test]
    fn test_banner_rule() {
        let run = |templates_validated, failures: Vec<HarnessError>| ValidationRun {
            report: RunReport::new(),
            templates_validated,
            failures,
        };

        assert!(run(4, vec![]).show_banner());
        assert!(!run(1, vec![]).show_banner());
        let failed = run(
            2,
            vec![HarnessError::Io(std::io::Error::new(ErrorKind::Other, "x"))],
        );
        assert!(!failed.show_banner());
        assert!(failed.into_result().is_err());
    }
}
