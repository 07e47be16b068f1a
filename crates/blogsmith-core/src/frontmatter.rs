//! Front matter blocks at the top of post files.

use serde::{Deserialize, Serialize};

use crate::{
    config::{Author, Link},
    error::{CoreError, Result},
};

/// Metadata block of a post, as written.
///
/// Dates stay as text here; [`crate::post::Post`] parses and checks them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub created: Option<String>,

    #[serde(default)]
    pub modified: Option<String>,

    /// Used for listings and `meta description`.
    #[serde(default)]
    pub summary: Option<String>,

    /// Tag slugs.
    #[serde(default)]
    pub tags: Vec<String>,

    /// `top`, `last`, `draft` or empty.
    #[serde(default)]
    pub state: Option<String>,

    /// Cover image.
    #[serde(default)]
    pub image: Option<String>,

    #[serde(default, alias = "author")]
    pub authors: Option<Vec<Author>>,

    #[serde(default)]
    pub license: Option<Link>,

    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub keywords: Option<String>,

    /// Hand-written JSON-LD, used instead of the generated block.
    #[serde(default)]
    pub jsonld: Option<String>,
}

/// Delimiter types for front matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML delimited by `---`.
    Yaml,
    /// TOML delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// The fence line for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split content into the front matter block and the body.
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.trim_start_matches('\u{feff}').trim_start();

    let format = if content.starts_with("---") {
        FrontmatterFormat::Yaml
    } else if content.starts_with("+++") {
        FrontmatterFormat::Toml
    } else {
        return None;
    };

    let delimiter = format.delimiter();
    let after_first = &content[delimiter.len()..];
    let closing = after_first.find(&format!("\n{delimiter}"))?;

    let block = after_first[..closing].trim();
    let body = after_first[closing + 1 + delimiter.len()..].trim_start();

    Some((format, block, body))
}

/// Parse the front matter of `content`, returning it with the remaining body.
///
/// A file without a front matter block yields the default metadata.
pub fn parse_frontmatter<'a>(content: &'a str, path: &str) -> Result<(Frontmatter, &'a str)> {
    let Some((format, block, body)) = split_frontmatter(content) else {
        return Ok((Frontmatter::default(), content));
    };

    let frontmatter = match format {
        FrontmatterFormat::Yaml if block.is_empty() => Frontmatter::default(),
        FrontmatterFormat::Yaml => {
            serde_yaml::from_str(block).map_err(|e| CoreError::front_matter(path, e.to_string()))?
        }
        FrontmatterFormat::Toml => {
            toml::from_str(block).map_err(|e| CoreError::front_matter(path, e.to_string()))?
        }
    };

    Ok((frontmatter, body))
}
