//! Page rendering with minijinja.

use std::path::Path;

use minijinja::{path_loader, Environment, UndefinedBehavior};
use serde_json::Value;

/// Template engine rooted at the source directory.
///
/// Templates are addressed by their `/`-separated path relative to the
/// source root, so layouts and partials can be shared between the root
/// page and sub-pages. The loader caches parsed templates, so a renderer
/// should live for one render invocation only.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Create a renderer loading templates from `source_dir`.
    pub fn new(source_dir: &Path, strict: bool) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(source_dir));

        if strict {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }

        Self { env }
    }

    /// Render a template with the content record as its context.
    pub fn render(&self, template: &str, content: &Value) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;
        tmpl.render(content)
    }
}
