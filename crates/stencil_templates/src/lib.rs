//! # stencil_templates
//!
//! Template catalog and rendering for stencil.
//!
//! The catalog is a fixed set of [`TemplateDescriptor`]s. A
//! [`TemplateRenderer`] materializes one descriptor into the output root
//! through a [`RenderEngine`]:
//!
//! - [`CookiecutterEngine`] shells out to `cookiecutter --no-input`
//! - [`BuiltinEngine`] renders `{{ cookiecutter.* }}` references in-process
//!
//! ## Example
//!
//! ```rust,no_run
//! use stencil_templates::{EngineKind, TemplateCatalog, TemplateRenderer};
//! use std::path::Path;
//!
//! let catalog = TemplateCatalog::builtin();
//! let renderer = TemplateRenderer::new(
//!     "project-templates",
//!     "project-templates/_test-output",
//!     EngineKind::Cookiecutter.build(Path::new("cookiecutter")),
//! );
//!
//! let cli = catalog.get("cli").unwrap();
//! let project_dir = renderer.render(cli).unwrap();
//! ```

pub mod builtin;
pub mod context;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod renderer;

pub use builtin::BuiltinEngine;
pub use context::{slugify, CookiecutterContext};
pub use descriptor::{TemplateCatalog, TemplateDescriptor};
pub use engine::{CookiecutterEngine, EngineKind, RenderEngine};
pub use error::{TemplateError, TemplateResult};
pub use renderer::TemplateRenderer;
