//! Template rendering into the output root.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::descriptor::TemplateDescriptor;
use crate::engine::RenderEngine;
use crate::error::{TemplateError, TemplateResult};

/// Renders descriptors from a templates root into an output root.
pub struct TemplateRenderer {
    templates_dir: PathBuf,
    output_root: PathBuf,
    engine: Box<dyn RenderEngine>,
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new(
        templates_dir: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        engine: Box<dyn RenderEngine>,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            output_root: output_root.into(),
            engine,
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Directory holding a template's sources.
    pub fn source_dir(&self, descriptor: &TemplateDescriptor) -> PathBuf {
        self.templates_dir.join(descriptor.source)
    }

    /// Directory a template renders to.
    pub fn output_dir(&self, descriptor: &TemplateDescriptor) -> PathBuf {
        self.output_root.join(descriptor.output)
    }

    /// Render a template and return the populated project directory.
    ///
    /// Output from a previous render is removed first; the result never
    /// merges old and new files. The returned path is absolute so steps
    /// run in it do not depend on the caller's working directory.
    pub fn render(&self, descriptor: &TemplateDescriptor) -> TemplateResult<PathBuf> {
        let source_dir = self.source_dir(descriptor);
        if !source_dir.is_dir() {
            return Err(TemplateError::SourceMissing(source_dir));
        }

        let output_dir = self.output_dir(descriptor);
        if output_dir.exists() {
            info!("Removing previous output {:?}", output_dir);
            fs::remove_dir_all(&output_dir)?;
        }
        fs::create_dir_all(&self.output_root)?;

        info!(
            "Generating {} template with {}...",
            descriptor.source,
            self.engine.name()
        );
        self.engine
            .render(&source_dir, &self.output_root, &descriptor.variables())?;

        if !contains_file(&output_dir) {
            return Err(TemplateError::EmptyRender(output_dir));
        }

        let output_dir = absolute(output_dir)?;
        info!("Generated: {:?}", output_dir);
        Ok(output_dir)
    }
}

/// Anchor a relative path at the current directory without resolving symlinks.
fn absolute(path: PathBuf) -> TemplateResult<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn contains_file(dir: &Path) -> bool {
    dir.is_dir()
        && WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .any(|e| e.file_type().is_file())
}
