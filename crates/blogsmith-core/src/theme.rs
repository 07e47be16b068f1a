//! Theme descriptors from `themes/<id>/theme.yaml`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    config::Author,
    error::{CoreError, FieldError, Result},
    source::{CONFIG_FILE, ContentSource, THEME_FILE},
    url::theme_path,
};

/// Template every theme provides and every post uses unless told otherwise.
pub const DEFAULT_TEMPLATE: &str = "post";

/// A loaded theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    /// Directory name under `themes/`.
    #[serde(skip)]
    pub id: String,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub authors: Vec<Author>,

    /// Post templates this theme declares.
    #[serde(default)]
    pub templates: Vec<String>,

    /// Code highlighting stylesheets.
    #[serde(default)]
    pub highlights: Vec<Highlight>,

    /// XSL stylesheets, relative to the theme directory.
    #[serde(default)]
    pub sitemap_xsl: Option<String>,
    #[serde(default)]
    pub rss_xsl: Option<String>,
    #[serde(default)]
    pub atom_xsl: Option<String>,
}

/// A highlighting stylesheet shipped with the theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// File stem of `themes/<id>/<name>.css`.
    #[serde(default)]
    pub name: String,

    /// CSS media query; at most one highlight may leave it empty.
    #[serde(default)]
    pub media: Option<String>,
}

impl Theme {
    /// Whether posts may use `template`.
    #[must_use]
    pub fn has_template(&self, template: &str) -> bool {
        self.templates.iter().any(|t| t == template)
    }

    fn sanitize(&mut self, source: &dyn ContentSource, file: &str) -> std::result::Result<(), FieldError> {
        let locate = |e: FieldError, parent: String| {
            let mut e = e.nested(&parent);
            e.file = file.to_string();
            e
        };

        for (i, author) in self.authors.iter().enumerate() {
            author.sanitize().map_err(|e| locate(e, format!("authors[{i}]")))?;
        }

        if !self.has_template(DEFAULT_TEMPLATE) {
            self.templates.push(DEFAULT_TEMPLATE.to_string());
        }
        let mut seen = HashSet::new();
        for template in &self.templates {
            if !seen.insert(template.as_str()) {
                return Err(FieldError::new(file, "templates", "duplicate value").with_value(template));
            }
        }

        for (field, xsl) in [
            ("sitemap_xsl", &self.sitemap_xsl),
            ("rss_xsl", &self.rss_xsl),
            ("atom_xsl", &self.atom_xsl),
        ] {
            if let Some(xsl) = xsl {
                if !source.exists(&theme_path(&self.id, xsl)) {
                    return Err(FieldError::new(file, field, "not found").with_value(xsl));
                }
            }
        }

        let mut bare_media = false;
        for (i, highlight) in self.highlights.iter().enumerate() {
            if highlight.name.trim().is_empty() {
                return Err(FieldError::required(file, format!("highlights[{i}].name")));
            }
            if highlight.media.as_deref().is_none_or(str::is_empty) {
                if bare_media {
                    return Err(FieldError::required(file, format!("highlights[{i}].media")));
                }
                bare_media = true;
            }
        }

        Ok(())
    }
}

/// Load and validate the theme named `id`.
pub fn load_theme(source: &dyn ContentSource, id: &str) -> Result<Theme> {
    let file = theme_path(id, THEME_FILE);
    if !source.exists(&file) {
        return Err(CoreError::reference(CONFIG_FILE, "theme", "theme not found", id));
    }

    let text = source.read_to_string(&file)?;
    let mut theme: Theme = if text.trim().is_empty() {
        serde_yaml::from_str("{}")?
    } else {
        serde_yaml::from_str(&text)?
    };
    theme.id = id.to_string();
    theme.sanitize(source, &file)?;

    tracing::debug!(theme = %id, templates = ?theme.templates, "loaded theme");
    Ok(theme)
}
