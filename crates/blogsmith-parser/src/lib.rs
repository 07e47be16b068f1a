//! blogsmith parser library
//!
//! The markdown engine behind post and tag loading.

pub mod markdown;
pub mod syntax;

use blogsmith_core::content::{ParsedContent, TocEntry};
pub use markdown::MarkdownParser;
pub use syntax::SyntaxHighlighter;
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Markdown parsing error.
    #[error("markdown error: {0}")]
    Markdown(#[from] markdown::MarkdownError),
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParserError>;

/// A markdown engine: source text in, HTML plus metadata out.
pub trait ContentParser: Send + Sync {
    /// Convert a whole file, front matter included.
    fn parse(&self, content: &str, path: &str) -> Result<ParsedContent>;

    /// Convert a fragment that has no front matter.
    fn parse_fragment(&self, body: &str) -> Result<(String, Vec<TocEntry>)>;

    /// Stylesheet for a named highlighting scheme, when the engine bundles one.
    fn highlight_stylesheet(&self, _name: &str) -> Option<String> {
        None
    }
}

impl ContentParser for MarkdownParser {
    fn parse(&self, content: &str, path: &str) -> Result<ParsedContent> {
        Ok(MarkdownParser::parse(self, content, path)?)
    }

    fn parse_fragment(&self, body: &str) -> Result<(String, Vec<TocEntry>)> {
        Ok(self.parse_body(body))
    }

    fn highlight_stylesheet(&self, name: &str) -> Option<String> {
        self.highlighter().stylesheet(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_parser_trait() {
        let parser: Box<dyn ContentParser> = Box::new(MarkdownParser::new());
        let result = parser
            .parse("---\ntitle: \"Trait Test\"\n---\n\nContent", "posts/a.md")
            .expect("parse");
        assert_eq!(result.frontmatter.title, "Trait Test");

        let (html, toc) = parser.parse_fragment("All things *Rust*.").expect("fragment");
        assert_eq!(html, "<p>All things <em>Rust</em>.</p>\n");
        assert!(toc.is_empty());
    }

    #[test]
    fn test_front_matter_error() {
        let parser = MarkdownParser::new();
        let result = ContentParser::parse(&parser, "---\ntags: [a\n---\nbody", "posts/bad.md");
        assert!(matches!(result, Err(ParserError::Markdown(_))));
    }
}
