//! Post records built from markdown engine output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    config::{Author, Config, Link},
    content::{ParsedContent, TocEntry, post_slug, summarize},
    date::parse_datetime,
    error::{FieldError, Result},
    theme::DEFAULT_TEMPLATE,
};

/// Characters kept when a summary is derived from the body.
pub const SUMMARY_CHARS: usize = 200;

/// Where a post sits in the canonical order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    /// Pinned before everything else.
    Top,
    /// Pushed after everything else.
    Last,
    /// Hidden unless previewing.
    Draft,
    #[default]
    Default,
}

impl PostState {
    /// Parse the front matter value; empty and `default` are the same thing.
    pub fn parse(s: Option<&str>) -> Option<Self> {
        match s.map(str::trim) {
            None | Some("") | Some("default") => Some(Self::Default),
            Some("top") => Some(Self::Top),
            Some("last") => Some(Self::Last),
            Some("draft") => Some(Self::Draft),
            Some(_) => None,
        }
    }
}

/// A validated post, before cross-referencing.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Source path, relative to the site root.
    pub path: String,
    /// Path-derived key, e.g. `posts/2024/hello`.
    pub slug: String,
    pub title: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub summary: String,
    /// Declared tag slugs, in front matter order.
    pub tags: Vec<String>,
    pub state: PostState,
    pub image: Option<String>,
    pub authors: Vec<Author>,
    pub license: Link,
    pub template: String,
    pub language: String,
    /// Front matter keywords; the site model derives them from tags when absent.
    pub keywords: Option<String>,
    /// Rendered HTML body.
    pub content: String,
    pub toc: Vec<TocEntry>,
    /// Front matter JSON-LD; the site model generates one when absent.
    pub jsonld: Option<String>,
}

fn date_field(path: &str, field: &str, value: &str) -> std::result::Result<DateTime<Utc>, FieldError> {
    parse_datetime(value).ok_or_else(|| FieldError::new(path, field, "is not a valid date").with_value(value))
}

impl Post {
    /// Validate parsed content from `path` and fill config fallbacks.
    pub fn from_parsed(path: &str, parsed: ParsedContent, config: &Config) -> Result<Self> {
        let fm = parsed.frontmatter;

        if fm.title.trim().is_empty() {
            return Err(FieldError::required(path, "title").into());
        }

        let slug = post_slug(path)?;

        if fm.tags.is_empty() {
            return Err(FieldError::required(path, "tags").into());
        }

        let state = PostState::parse(fm.state.as_deref()).ok_or_else(|| {
            FieldError::new(path, "state", "must be one of top, last, draft").with_value(fm.state.as_deref().unwrap_or(""))
        })?;

        let created = match fm.created.as_deref() {
            Some(s) if !s.trim().is_empty() => date_field(path, "created", s)?,
            _ => return Err(FieldError::required(path, "created").into()),
        };
        let modified = match fm.modified.as_deref() {
            Some(s) if !s.trim().is_empty() => date_field(path, "modified", s)?,
            _ => created,
        };

        let authors = match fm.authors {
            Some(authors) if !authors.is_empty() => {
                for (i, author) in authors.iter().enumerate() {
                    author.sanitize().map_err(|e| {
                        let mut e = e.nested(&format!("authors[{i}]"));
                        e.file = path.to_string();
                        e
                    })?;
                }
                authors
            }
            _ => vec![config.author.clone()],
        };

        let license = match fm.license {
            Some(license) => {
                license.sanitize().map_err(|e| {
                    let mut e = e.nested("license");
                    e.file = path.to_string();
                    e
                })?;
                license
            }
            None => config.license.clone(),
        };

        let summary = fm
            .summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| summarize(&parsed.html, SUMMARY_CHARS));

        Ok(Self {
            path: path.to_string(),
            slug,
            title: fm.title,
            created,
            modified,
            summary,
            tags: fm.tags,
            state,
            image: fm.image,
            authors,
            license,
            template: fm
                .template
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            language: fm
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| config.language.clone()),
            keywords: fm.keywords.filter(|k| !k.trim().is_empty()),
            content: parsed.html,
            toc: parsed.toc,
            jsonld: fm.jsonld.filter(|ld| !ld.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.state == PostState::Draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::Frontmatter;

    fn config() -> Config {
        Config::from_yaml_str(
            r#"
title: Test Blog
url: https://example.com
theme: default
language: en
uptime: 2020-01-01T00:00:00Z
author:
  name: alice
license:
  url: https://example.com/license
  text: MIT
"#,
        )
        .expect("config")
    }

    fn parsed(fm: Frontmatter) -> ParsedContent {
        ParsedContent {
            frontmatter: fm,
            html: "<p>Body text here.</p>".to_string(),
            raw: "Body text here.".to_string(),
            toc: Vec::new(),
        }
    }

    fn frontmatter() -> Frontmatter {
        Frontmatter {
            title: "Hello".into(),
            created: Some("2024-01-14".into()),
            tags: vec!["rust".into()],
            ..Frontmatter::default()
        }
    }

    #[test]
    fn test_post_fallbacks() {
        let post = Post::from_parsed("posts/hello.md", parsed(frontmatter()), &config()).expect("post");

        assert_eq!(post.slug, "posts/hello");
        assert_eq!(post.modified, post.created);
        assert_eq!(post.state, PostState::Default);
        assert_eq!(post.template, DEFAULT_TEMPLATE);
        assert_eq!(post.language, "en");
        assert_eq!(post.authors[0].name, "alice");
        assert_eq!(post.license.text, "MIT");
        assert_eq!(post.summary, "Body text here.");
        assert!(post.jsonld.is_none());
    }

    #[test]
    fn test_post_overrides() {
        let fm = Frontmatter {
            modified: Some("2024-02-01T08:00:00Z".into()),
            summary: Some("Custom".into()),
            state: Some("top".into()),
            template: Some("page".into()),
            language: Some("fr".into()),
            jsonld: Some("{\"@type\": \"Article\"}".into()),
            ..frontmatter()
        };
        let post = Post::from_parsed("posts/hello.md", parsed(fm), &config()).expect("post");
        assert!(post.modified > post.created);
        assert_eq!(post.summary, "Custom");
        assert_eq!(post.state, PostState::Top);
        assert_eq!(post.template, "page");
        assert_eq!(post.language, "fr");
        assert_eq!(post.jsonld.as_deref(), Some("{\"@type\": \"Article\"}"));
    }

    #[test]
    fn test_post_validation() {
        let cases = [
            (Frontmatter { title: String::new(), ..frontmatter() }, "title"),
            (Frontmatter { tags: Vec::new(), ..frontmatter() }, "tags"),
            (Frontmatter { state: Some("pinned".into()), ..frontmatter() }, "state"),
            (Frontmatter { created: None, ..frontmatter() }, "created"),
            (Frontmatter { created: Some("soon".into()), ..frontmatter() }, "created"),
        ];

        for (fm, field) in cases {
            let err = Post::from_parsed("posts/hello.md", parsed(fm), &config()).unwrap_err();
            let detail = err.field_error().expect("field error");
            assert_eq!(detail.field, field);
            assert_eq!(detail.file, "posts/hello.md");
        }
    }

    #[test]
    fn test_post_slug_rules() {
        let err = Post::from_parsed("notes/hello.md", parsed(frontmatter()), &config()).unwrap_err();
        assert_eq!(err.field_error().expect("field error").field, "slug");
    }

    #[test]
    fn test_draft_state() {
        let fm = Frontmatter { state: Some("draft".into()), ..frontmatter() };
        let post = Post::from_parsed("posts/hello.md", parsed(fm), &config()).expect("post");
        assert!(post.is_draft());
    }
}
