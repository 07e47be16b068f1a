//! Tag definitions from `tags.yaml`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    error::{FieldError, Result},
    source::TAGS_FILE,
};

/// One tag as declared in `tags.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique key, also the file name of the tag page.
    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub title: String,

    /// Markdown description.
    #[serde(default)]
    pub content: String,

    /// CSS color for tag badges.
    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub keywords: Option<String>,
}

impl Tag {
    fn sanitize(&self) -> std::result::Result<(), FieldError> {
        if self.slug.trim().is_empty() {
            return Err(FieldError::required(TAGS_FILE, "slug"));
        }
        if self.slug.contains('/') || self.slug.chars().any(char::is_whitespace) {
            return Err(
                FieldError::new(TAGS_FILE, "slug", "must not contain '/' or whitespace").with_value(&self.slug),
            );
        }
        if self.title.trim().is_empty() {
            return Err(FieldError::required(TAGS_FILE, "title"));
        }
        if self.content.trim().is_empty() {
            return Err(FieldError::required(TAGS_FILE, "content"));
        }
        Ok(())
    }
}

/// Parse and validate the tag list.
///
/// Tags keep file order. A duplicate slug is rejected.
pub fn load_tags(text: &str) -> Result<Vec<Tag>> {
    let tags: Vec<Tag> = if text.trim().is_empty() {
        Vec::new()
    } else {
        serde_yaml::from_str(text)?
    };

    let mut seen = HashSet::with_capacity(tags.len());
    for (i, tag) in tags.iter().enumerate() {
        let field = format!("[{i}]");
        tag.sanitize().map_err(|e| e.nested(&field))?;

        if !seen.insert(tag.slug.as_str()) {
            return Err(FieldError::new(TAGS_FILE, format!("{field}.slug"), "duplicate value")
                .with_value(&tag.slug)
                .into());
        }
    }

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    const TAGS: &str = r##"
- slug: rust
  title: Rust
  content: All things *Rust*.
  color: "#dea584"
- slug: go
  title: Go
  content: Gophers.
"##;

    #[test]
    fn test_load_tags() {
        let tags = load_tags(TAGS).expect("load tags");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].slug, "rust");
        assert_eq!(tags[0].color.as_deref(), Some("#dea584"));
        assert_eq!(tags[1].title, "Go");
    }

    #[test]
    fn test_empty_file() {
        assert!(load_tags("").expect("load tags").is_empty());
    }

    #[test]
    fn test_duplicate_slug() {
        let text = format!("{TAGS}- slug: rust\n  title: Again\n  content: dup\n");
        let err = load_tags(&text).unwrap_err();
        let field = err.field_error().expect("field error");
        assert_eq!(field.field, "[2].slug");
        assert_eq!(field.value.as_deref(), Some("rust"));
    }

    #[test]
    fn test_missing_fields() {
        for (text, want) in [
            ("- title: T\n  content: c\n", "[0].slug"),
            ("- slug: s\n  content: c\n", "[0].title"),
            ("- slug: s\n  title: T\n", "[0].content"),
        ] {
            let err = load_tags(text).unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
            assert_eq!(err.field_error().expect("field error").field, want);
        }
    }
}
