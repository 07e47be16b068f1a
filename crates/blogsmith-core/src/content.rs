//! Markdown engine output and path helpers shared by loaders.

use serde::{Deserialize, Serialize};

use crate::{error::FieldError, frontmatter::Frontmatter, source::POSTS_DIR};

/// What the markdown engine hands back for one source file.
#[derive(Debug, Clone)]
pub struct ParsedContent {
    /// Parsed front matter metadata.
    pub frontmatter: Frontmatter,

    /// Rendered HTML body.
    pub html: String,

    /// Raw source body (without front matter).
    pub raw: String,

    /// Table of contents extracted from headings.
    pub toc: Vec<TocEntry>,
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,

    /// Heading text.
    pub text: String,

    /// Anchor ID for linking.
    pub id: String,
}

/// Derive a post slug from its source path.
///
/// `posts/2024/hello.md` becomes `posts/2024/hello`. The slug must live under
/// `posts/` and contain no whitespace.
pub fn post_slug(path: &str) -> Result<String, FieldError> {
    let stem = match path.len().checked_sub(3) {
        Some(cut) if path.is_char_boundary(cut) && path[cut..].eq_ignore_ascii_case(".md") => &path[..cut],
        _ => path,
    };
    let slug = stem.trim_matches(|c| c == '.' || c == '/');

    if slug.chars().any(char::is_whitespace) {
        return Err(FieldError::new(path, "slug", "must not contain whitespace").with_value(slug));
    }

    let under_posts = slug
        .strip_prefix(POSTS_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| !rest.is_empty());
    if !under_posts {
        return Err(FieldError::new(path, "slug", format!("must be under {POSTS_DIR}/")).with_value(slug));
    }

    Ok(slug.to_string())
}

/// Strip HTML tags from content.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let mut result = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Truncate text at a word boundary, counting characters rather than bytes.
#[must_use]
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text.char_indices().nth(max_chars).map_or(text.len(), |(idx, _)| idx);
    let truncated = &text[..cut];

    match truncated.rfind(char::is_whitespace) {
        Some(space) if space > 0 => format!("{}...", truncated[..space].trim_end()),
        _ => format!("{truncated}..."),
    }
}

/// Plain-text summary of an HTML body.
#[must_use]
pub fn summarize(html: &str, max_chars: usize) -> String {
    let text = strip_html(html);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_at_word_boundary(&text, max_chars)
}
