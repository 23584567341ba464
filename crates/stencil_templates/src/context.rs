//! Loading of `cookiecutter.json` defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};

/// Name of the context file at the root of a template source directory.
pub const CONTEXT_FILE: &str = "cookiecutter.json";

/// Default variable values declared by a template.
#[derive(Debug, Clone, Default)]
pub struct CookiecutterContext {
    values: BTreeMap<String, String>,
}

impl CookiecutterContext {
    /// Load the context file from a template source directory.
    ///
    /// A template without a context file yields an empty context.
    pub fn load(source_dir: &Path) -> TemplateResult<Self> {
        let path = source_dir.join(CONTEXT_FILE);
        if !path.exists() {
            debug!("No {} in {:?}", CONTEXT_FILE, source_dir);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let raw: Value = serde_json::from_str(&content)?;
        let object = raw.as_object().ok_or_else(|| TemplateError::InvalidContext {
            path: path.clone(),
            message: "expected a JSON object".to_string(),
        })?;

        let mut values = BTreeMap::new();
        for (key, value) in object {
            // Private keys (`_copy_without_render`, `_extensions`) configure
            // cookiecutter itself.
            if key.starts_with('_') {
                continue;
            }
            let value = match value {
                Value::String(s) => s.clone(),
                // A list is a choice variable; the first entry is the default.
                Value::Array(choices) => match choices.first() {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => continue,
                },
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Null | Value::Object(_) => continue,
            };
            values.insert(key.clone(), value);
        }

        Ok(Self { values })
    }

    /// Build a context from explicit values.
    pub fn from_values(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }
}

/// Turn a display name into a slug: lowercase, runs of anything that is not
/// ASCII alphanumeric collapse to a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
