//! In-process rendering of cookiecutter-layout templates.
//!
//! Supports plain `{{ cookiecutter.<name> }}` references in path components
//! and file contents. Jinja control blocks, filters and hooks are left to the
//! real cookiecutter engine.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::context::{slugify, CookiecutterContext};
use crate::engine::RenderEngine;
use crate::error::{TemplateError, TemplateResult};

/// Renders templates without an external engine.
pub struct BuiltinEngine {
    variable_pattern: Regex,
}

impl Default for BuiltinEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinEngine {
    pub fn new() -> Self {
        Self {
            // Match {{ cookiecutter.variable_name }}
            variable_pattern: Regex::new(r"\{\{\s*cookiecutter\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
                .expect("variable pattern is a valid regex"),
        }
    }

    /// Merge the template's defaults with the provided variables and fill in
    /// the derived names every template relies on.
    pub fn build_context(
        &self,
        defaults: &CookiecutterContext,
        provided: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let mut vars = defaults.values().clone();
        for (k, v) in provided {
            vars.insert(k.clone(), v.clone());
        }

        // Resolve plain references between defaults, e.g.
        // "description": "{{ cookiecutter.project_name }} service"
        let snapshot = vars.clone();
        for value in vars.values_mut() {
            if value.contains("{{") {
                *value = self.render_content(value, &snapshot);
            }
        }

        let project_name = vars.get("project_name").cloned().unwrap_or_default();
        if needs_derivation(vars.get("project_slug"), provided.contains_key("project_slug")) {
            vars.insert("project_slug".to_string(), slugify(&project_name));
        }
        if needs_derivation(vars.get("package_name"), provided.contains_key("package_name")) {
            let slug = vars.get("project_slug").cloned().unwrap_or_default();
            vars.insert("package_name".to_string(), slug.replace('-', "_"));
        }

        for (k, v) in &vars {
            if v.contains("{{") {
                warn!("Variable {} keeps an unevaluated expression: {}", k, v);
            }
        }

        vars
    }

    /// Render content by replacing variables. Unknown variables are kept
    /// verbatim.
    pub fn render_content(&self, content: &str, variables: &BTreeMap<String, String>) -> String {
        self.variable_pattern
            .replace_all(content, |caps: &Captures| match variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .to_string()
    }

    /// Render a relative path component by component.
    fn render_path(&self, path: &Path, variables: &BTreeMap<String, String>) -> PathBuf {
        path.components()
            .map(|c| self.render_content(&c.as_os_str().to_string_lossy(), variables))
            .collect()
    }

    /// Locate the `{{cookiecutter.project_slug}}`-style directory that holds
    /// the project skeleton.
    fn project_root(&self, source_dir: &Path) -> TemplateResult<PathBuf> {
        for entry in fs::read_dir(source_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type()?.is_dir() && self.variable_pattern.is_match(&name) {
                return Ok(entry.path());
            }
        }
        Err(TemplateError::RenderingFailed(format!(
            "no {{{{cookiecutter.*}}}} project directory in {}",
            source_dir.display()
        )))
    }

    fn render_file(
        &self,
        source: &Path,
        target: &Path,
        variables: &BTreeMap<String, String>,
    ) -> TemplateResult<()> {
        let bytes = fs::read(source)?;
        let is_script = match String::from_utf8(bytes) {
            Ok(content) => {
                fs::write(target, self.render_content(&content, variables))?;
                content.starts_with("#!")
            }
            Err(_) => {
                // Binary files are copied as-is
                fs::copy(source, target)?;
                false
            }
        };
        copy_permissions(source, target, is_script)?;
        Ok(())
    }
}

impl RenderEngine for BuiltinEngine {
    fn name(&self) -> &str {
        "builtin"
    }

    fn render(
        &self,
        source_dir: &Path,
        output_root: &Path,
        variables: &BTreeMap<String, String>,
    ) -> TemplateResult<()> {
        let defaults = CookiecutterContext::load(source_dir)?;
        let vars = self.build_context(&defaults, variables);
        let project_root = self.project_root(source_dir)?;

        info!(
            "Rendering {:?} into {:?} (builtin engine)",
            project_root, output_root
        );

        for entry in WalkDir::new(&project_root).into_iter().filter_map(|e| e.ok()) {
            let source = entry.path();
            let relative = source
                .strip_prefix(source_dir)
                .map_err(|e| TemplateError::RenderingFailed(e.to_string()))?;

            let target = output_root.join(self.render_path(relative, &vars));
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                self.render_file(source, &target, &vars)?;
                debug!("Rendered: {:?}", target);
            }
        }

        Ok(())
    }
}

/// A derived variable is computed unless the caller set it or the template
/// gave it a literal default.
fn needs_derivation(current: Option<&String>, provided: bool) -> bool {
    if provided {
        return false;
    }
    match current {
        None => true,
        Some(value) => value.is_empty() || value.contains("{{"),
    }
}

#[cfg(unix)]
fn copy_permissions(source: &Path, target: &Path, executable: bool) -> TemplateResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut mode = fs::metadata(source)?.permissions().mode();
    if executable {
        mode |= 0o111;
    }
    fs::set_permissions(target, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_permissions(source: &Path, target: &Path, _executable: bool) -> TemplateResult<()> {
    fs::set_permissions(target, fs::metadata(source)?.permissions())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CONTEXT_FILE;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_content() {
        let engine = BuiltinEngine::new();
        let vars = vars(&[("project_name", "My App"), ("author", "me")]);

        let rendered = engine.render_content(
            "name = \"{{ cookiecutter.project_name }}\" by {{cookiecutter.author}} {{ cookiecutter.missing }}",
            &vars,
        );
        assert_eq!(
            rendered,
            "name = \"My App\" by me {{ cookiecutter.missing }}"
        );
    }

    #[test]
    fn test_derived_names() {
        let engine = BuiltinEngine::new();
        let defaults = CookiecutterContext::from_values(vars(&[
            ("project_name", "Default"),
            (
                "project_slug",
                "{{ cookiecutter.project_name.lower().replace(' ', '-') }}",
            ),
            ("description", "{{ cookiecutter.project_name }} tool"),
        ]));

        let context = engine.build_context(&defaults, &vars(&[("project_name", "Test CLI")]));
        assert_eq!(context["project_slug"], "test-cli");
        assert_eq!(context["package_name"], "test_cli");
        assert_eq!(context["description"], "Test CLI tool");
    }

    #[test]
    fn test_literal_defaults_are_kept() {
        let engine = BuiltinEngine::new();
        let defaults = CookiecutterContext::from_values(vars(&[
            ("project_name", "Test CLI"),
            ("package_name", "cli_pkg"),
        ]));

        let context = engine.build_context(&defaults, &BTreeMap::new());
        assert_eq!(context["project_slug"], "test-cli");
        assert_eq!(context["package_name"], "cli_pkg");
    }

    #[test]
    fn test_render_tree() {
        let templates = tempdir().unwrap();
        let source = templates.path().join("python-cli");
        let project = source.join("{{cookiecutter.project_slug}}");
        let package = project.join("src").join("{{cookiecutter.package_name}}");
        fs::create_dir_all(&package).unwrap();
        fs::write(
            source.join(CONTEXT_FILE),
            r#"{"project_name": "x", "project_slug": "{{ cookiecutter.project_name.lower() }}"}"#,
        )
        .unwrap();
        fs::write(
            project.join("simple.py"),
            "#!/usr/bin/env python\nprint('{{ cookiecutter.project_name }}')\n",
        )
        .unwrap();
        fs::write(package.join("cli.py"), "# {{ cookiecutter.package_name }}\n").unwrap();
        fs::write(project.join("logo.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let output = tempdir().unwrap();
        BuiltinEngine::new()
            .render(&source, output.path(), &vars(&[("project_name", "Test CLI")]))
            .unwrap();

        let rendered = output.path().join("test-cli");
        let simple = fs::read_to_string(rendered.join("simple.py")).unwrap();
        assert!(simple.contains("print('Test CLI')"));
        assert_eq!(
            fs::read_to_string(rendered.join("src/test_cli/cli.py")).unwrap(),
            "# test_cli\n"
        );
        assert_eq!(fs::read(rendered.join("logo.bin")).unwrap(), vec![0xff, 0xfe, 0x00]);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(rendered.join("simple.py")).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_missing_project_root() {
        let source = tempdir().unwrap();
        fs::create_dir_all(source.path().join("plain")).unwrap();
        let output = tempdir().unwrap();

        let err = BuiltinEngine::new()
            .render(source.path(), output.path(), &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, TemplateError::RenderingFailed(_)));
    }
}
