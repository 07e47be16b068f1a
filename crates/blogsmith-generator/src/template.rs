//! HTML template system for page generation.
//!
//! A deliberately small engine: `{{ name }}` interpolation and nothing else.
//! Loops and conditionals are resolved by the page renderer, which hands over
//! prebuilt HTML fragments.

use std::collections::HashMap;

use blogsmith_core::{
    ContentSource, CoreError, Theme,
    source::{LAYOUT_DIR, THEMES_DIR},
};
use thiserror::Error;
use tracing::debug;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("template {template}: missing required variable: {name}")]
    MissingVariable { template: String, name: String },

    /// Template not found.
    #[error("template not found: {0}")]
    NotFound(String),

    /// Invalid template syntax.
    #[error("template {template}: invalid syntax: {message}")]
    InvalidSyntax { template: String, message: String },

    /// A layout file could not be read.
    #[error("failed to load layout: {0}")]
    Source(#[from] CoreError),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Maps a template name and its data to page text.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &TemplateContext) -> Result<String>;
}

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Insert only when there is a value; pairs with `{{ key? }}`.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }
}

/// A named template body.
///
/// Variables are written `{{ name }}`; `{{ name? }}` renders empty when unset.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render the template with the given context.
    ///
    /// Substituted values are never rescanned for placeholders.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut out = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| TemplateError::InvalidSyntax {
                template: self.name.clone(),
                message: "unclosed {{ delimiter".to_string(),
            })?;

            let var = after[..end].trim();
            let (var, optional) = match var.strip_suffix('?') {
                Some(stripped) => (stripped.trim_end(), true),
                None => (var, false),
            };

            match context.get(var) {
                Some(value) => out.push_str(value),
                None if optional => {}
                None => {
                    return Err(TemplateError::MissingVariable {
                        template: self.name.clone(),
                        name: var.to_string(),
                    });
                }
            }

            rest = &after[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Registry of templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    /// Create a registry holding only the built-in layouts.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    /// Built-in layouts overlaid with `themes/<id>/layout/*.html`.
    pub fn from_theme(source: &dyn ContentSource, theme: &Theme) -> Result<Self> {
        let mut registry = Self::new();
        let dir = format!("{THEMES_DIR}/{}/{LAYOUT_DIR}", theme.id);

        for path in source.list(&dir)? {
            let Some(name) = path
                .strip_prefix(&dir)
                .and_then(|p| p.strip_prefix('/'))
                .and_then(|p| p.strip_suffix(".html"))
            else {
                continue;
            };
            if name.contains('/') {
                continue;
            }

            debug!(template = name, path = %path, "loaded layout");
            registry.register(Template::new(name, source.read_to_string(&path)?));
        }

        for name in &theme.templates {
            if registry.get(name).is_none() {
                return Err(TemplateError::NotFound(format!("{dir}/{name}.html")));
            }
        }

        Ok(registry)
    }

    fn register_defaults(&mut self) {
        self.register(Template::new("base", DEFAULT_BASE_TEMPLATE));
        self.register(Template::new("index", DEFAULT_INDEX_TEMPLATE));
        self.register(Template::new("tags", DEFAULT_TAGS_TEMPLATE));
        self.register(Template::new("tag", DEFAULT_TAG_TEMPLATE));
        self.register(Template::new("archive", DEFAULT_ARCHIVE_TEMPLATE));
        self.register(Template::new("post", DEFAULT_POST_TEMPLATE));
    }

    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.name.clone(), template);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Render a named template with the given context.
    pub fn render(&self, name: &str, context: &TemplateContext) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        template.render(context)
    }
}

impl Renderer for TemplateRegistry {
    fn render(&self, template: &str, context: &TemplateContext) -> Result<String> {
        TemplateRegistry::render(self, template, context)
    }
}

/// Page frame shared by every HTML output.
pub const DEFAULT_BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    <meta name="description" content="{{ description? }}">
    <meta name="keywords" content="{{ keywords? }}">
    <meta name="generator" content="blogsmith">
    <link rel="canonical" href="{{ canonical_url }}">
    {{ head? }}
</head>
<body>
    <header>
        <a class="site-title" href="{{ site_url }}">{{ site_title }}</a>
        <p class="subtitle">{{ subtitle? }}</p>
        <nav>{{ menus? }}</nav>
    </header>
    <main>
{{ content }}
    </main>
    <footer>{{ footer }}</footer>
</body>
</html>
"#;

pub const DEFAULT_INDEX_TEMPLATE: &str = r#"<section class="post-list">
    {{ posts }}
    {{ pagination? }}
</section>"#;

pub const DEFAULT_TAGS_TEMPLATE: &str = r#"<section class="tags">
    <h1>{{ page_title }}</h1>
    {{ tags }}
</section>"#;

pub const DEFAULT_TAG_TEMPLATE: &str = r#"<section class="tag">
    <h1>{{ page_title }}</h1>
    <div class="tag-content">{{ tag_content }}</div>
    {{ posts }}
</section>"#;

pub const DEFAULT_ARCHIVE_TEMPLATE: &str = r#"<section class="archive">
    <h1>{{ page_title }}</h1>
    {{ archives }}
</section>"#;

pub const DEFAULT_POST_TEMPLATE: &str = r#"<article class="post">
    <header>
        <h1>{{ page_title }}</h1>
        <time datetime="{{ created_iso }}">{{ created }}</time>
        <div class="tags">{{ tags? }}</div>
    </header>
    {{ toc? }}
    <div class="content">
{{ content }}
    </div>
    <p class="license">{{ license }}</p>
    <nav class="post-nav">{{ prev? }} {{ next? }}</nav>
</article>"#;

#[cfg(test)]
mod tests {
    use blogsmith_core::MemorySource;

    use super::*;

    fn theme(templates: &[&str]) -> Theme {
        Theme {
            id: "plain".to_string(),
            url: None,
            description: None,
            authors: Vec::new(),
            templates: templates.iter().map(|t| (*t).to_string()).collect(),
            highlights: Vec::new(),
            sitemap_xsl: None,
            rss_xsl: None,
            atom_xsl: None,
        }
    }

    #[test]
    fn test_template_simple_render() {
        let template = Template::new("test", "Hello, {{ name }}!");
        let ctx = TemplateContext::new().with_var("name", "World");
        assert_eq!(template.render(&ctx).expect("render"), "Hello, World!");
    }

    #[test]
    fn test_template_optional_variable() {
        let template = Template::new("test", "a{{ missing? }}b{{x ?}}c");
        assert_eq!(template.render(&TemplateContext::new()).expect("render"), "abc");
    }

    #[test]
    fn test_template_missing_required_variable() {
        let template = Template::new("test", "Hello, {{ name }}!");
        let err = template.render(&TemplateContext::new()).unwrap_err();
        assert!(matches!(err, TemplateError::MissingVariable { ref name, .. } if name == "name"));
    }

    #[test]
    fn test_template_unclosed() {
        let template = Template::new("test", "Hello, {{ name");
        assert!(matches!(
            template.render(&TemplateContext::new()),
            Err(TemplateError::InvalidSyntax { .. })
        ));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let template = Template::new("test", "{{ a }}{{ b }}");
        let ctx = TemplateContext::new().with_var("a", "{{ b }}").with_var("b", "!");
        assert_eq!(template.render(&ctx).expect("render"), "{{ b }}!");
    }

    #[test]
    fn test_registry_defaults() {
        let registry = TemplateRegistry::new();
        for name in ["base", "index", "tags", "tag", "archive", "post"] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }
        assert!(matches!(
            registry.render("nope", &TemplateContext::new()),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_registry_from_theme() {
        let source = MemorySource::new()
            .with("themes/plain/layout/post.html", "<p>{{ page_title }}</p>")
            .and_then(|s| s.with("themes/plain/layout/gallery.html", "<div>{{ content }}</div>"))
            .and_then(|s| s.with("themes/plain/layout/partials/x.html", "ignored"))
            .expect("source");

        let registry = TemplateRegistry::from_theme(&source, &theme(&["post", "gallery"])).expect("registry");
        let ctx = TemplateContext::new().with_var("page_title", "T");

        assert_eq!(Renderer::render(&registry, "post", &ctx).expect("render"), "<p>T</p>");
        assert!(registry.get("gallery").is_some());
        assert!(registry.get("partials/x").is_none());
        assert!(registry.get("archive").is_some());
    }

    #[test]
    fn test_registry_missing_declared_template() {
        let source = MemorySource::new();
        let err = TemplateRegistry::from_theme(&source, &theme(&["post", "gallery"])).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(ref p) if p == "themes/plain/layout/gallery.html"));
    }
}
