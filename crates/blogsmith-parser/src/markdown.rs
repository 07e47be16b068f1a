//! Markdown parser using pulldown-cmark.

use std::collections::HashMap;

use blogsmith_core::{
    content::{ParsedContent, TocEntry},
    frontmatter::parse_frontmatter,
};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use thiserror::Error;

use crate::syntax::SyntaxHighlighter;

/// Markdown parsing errors.
#[derive(Debug, Error)]
pub enum MarkdownError {
    /// Failed to parse front matter.
    #[error("front matter error: {0}")]
    Frontmatter(#[from] blogsmith_core::error::CoreError),
}

/// Result type for markdown operations.
pub type Result<T> = std::result::Result<T, MarkdownError>;

/// Markdown parser with syntax highlighting support.
#[derive(Debug)]
pub struct MarkdownParser {
    highlighter: SyntaxHighlighter,
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

struct OpenHeading {
    /// Index of the heading's start event, patched once the text is known.
    start: usize,
    level: HeadingLevel,
    id: Option<String>,
    text: String,
}

impl MarkdownParser {
    /// Create a new markdown parser with default options.
    #[must_use]
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self {
            highlighter: SyntaxHighlighter::default(),
            options,
        }
    }

    /// The highlighter used for fenced code.
    #[must_use]
    pub fn highlighter(&self) -> &SyntaxHighlighter {
        &self.highlighter
    }

    /// Parse a markdown file with front matter.
    pub fn parse(&self, content: &str, path: &str) -> Result<ParsedContent> {
        let (frontmatter, body) = parse_frontmatter(content, path)?;
        let (html, toc) = self.render_markdown(body);

        Ok(ParsedContent {
            frontmatter,
            html,
            raw: body.to_string(),
            toc,
        })
    }

    /// Render a markdown fragment without front matter.
    pub fn parse_body(&self, body: &str) -> (String, Vec<TocEntry>) {
        self.render_markdown(body)
    }

    /// Render markdown to HTML, anchoring every heading and collecting a TOC.
    fn render_markdown(&self, content: &str) -> (String, Vec<TocEntry>) {
        let mut events: Vec<Event<'_>> = Vec::new();
        let mut toc = Vec::new();
        let mut used_ids: HashMap<String, usize> = HashMap::new();
        let mut heading: Option<OpenHeading> = None;
        let mut code: Option<(Option<String>, String)> = None;

        for event in Parser::new_ext(content, self.options) {
            if let Some(open) = heading.as_mut() {
                if let Event::Text(text) | Event::Code(text) = &event {
                    open.text.push_str(text);
                }
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                        CodeBlockKind::Indented => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, buf)) = code.as_mut() {
                        buf.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, buf)) = code.take() {
                        let highlighted = self.highlighter.highlight(&buf, lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Start(Tag::Heading { level, id, classes, attrs }) => {
                    heading = Some(OpenHeading {
                        start: events.len(),
                        level,
                        id: id.map(|i| i.to_string()),
                        text: String::new(),
                    });
                    events.push(Event::Start(Tag::Heading { level, id: None, classes, attrs }));
                }
                Event::End(TagEnd::Heading(level)) => {
                    if let Some(open) = heading.take() {
                        let base = open.id.unwrap_or_else(|| slugify(&open.text));
                        let anchor = unique_id(&mut used_ids, base);
                        if let Some(Event::Start(Tag::Heading { id, .. })) = events.get_mut(open.start) {
                            *id = Some(CowStr::from(anchor.clone()));
                        }
                        toc.push(TocEntry {
                            level: open.level as u8,
                            text: open.text,
                            id: anchor,
                        });
                    }
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        (out, toc)
    }
}

/// Disambiguate repeated heading anchors with a numeric suffix.
fn unique_id(used: &mut HashMap<String, usize>, base: String) -> String {
    let base = if base.is_empty() { "section".to_string() } else { base };
    let count = used.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 { base } else { format!("{base}-{}", *count - 1) }
}

/// Convert text to a URL-safe slug.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
