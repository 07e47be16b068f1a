//! Syntax highlighting for code blocks.
//!
//! Code is emitted with CSS classes rather than inline styles, so a theme can
//! swap colour schemes through its `highlights` stylesheets.

use syntect::{
    highlighting::ThemeSet,
    html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style},
    parsing::SyntaxSet,
    util::LinesWithEndings,
};

/// Prefix of every generated highlight class.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Syntax highlighter using syntect.
#[derive(Debug)]
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Names of the bundled colour schemes.
    pub fn available_themes(&self) -> Vec<&str> {
        self.theme_set.themes.keys().map(String::as_str).collect()
    }

    /// Stylesheet for the bundled colour scheme `name`, if there is one.
    pub fn stylesheet(&self, name: &str) -> Option<String> {
        let theme = self.theme_set.themes.get(name)?;
        css_for_theme_with_class_style(theme, CLASS_STYLE).ok()
    }

    /// Highlight a fenced code block.
    ///
    /// Unknown languages are escaped and wrapped without highlighting.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let Some(syntax) = lang.and_then(|l| self.syntax_set.find_syntax_by_token(l)) else {
            return plain_block(code, lang);
        };

        let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            if generator.parse_html_for_line_which_includes_newline(line).is_err() {
                return plain_block(code, lang);
            }
        }

        format!(
            "<pre class=\"highlight\"><code{}>{}</code></pre>\n",
            lang_class(lang),
            generator.finalize()
        )
    }
}

fn lang_class(lang: Option<&str>) -> String {
    lang.map(|l| format!(" class=\"language-{}\"", html_escape(l)))
        .unwrap_or_default()
}

fn plain_block(code: &str, lang: Option<&str>) -> String {
    format!("<pre><code{}>{}</code></pre>\n", lang_class(lang), html_escape(code))
}

/// Escape HTML special characters.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust() {
        let highlighter = SyntaxHighlighter::default();
        let html = highlighter.highlight("fn main() {\n    println!(\"Hello\");\n}\n", Some("rust"));

        assert!(html.starts_with("<pre class=\"highlight\">"));
        assert!(html.contains("language-rust"));
        assert!(html.contains("hl-"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_highlight_unknown_language() {
        let highlighter = SyntaxHighlighter::default();
        let html = highlighter.highlight("a < b", Some("unknown_lang_xyz"));
        assert_eq!(html, "<pre><code class=\"language-unknown_lang_xyz\">a &lt; b</code></pre>\n");
    }

    #[test]
    fn test_highlight_no_language() {
        let highlighter = SyntaxHighlighter::default();
        let html = highlighter.highlight("plain text", None);
        assert_eq!(html, "<pre><code>plain text</code></pre>\n");
    }

    #[test]
    fn test_stylesheet() {
        let highlighter = SyntaxHighlighter::default();
        assert!(highlighter.available_themes().contains(&"base16-ocean.dark"));

        let css = highlighter.stylesheet("base16-ocean.dark").expect("bundled theme");
        assert!(css.contains(".hl-"));
        assert!(highlighter.stylesheet("no-such-theme").is_none());
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
    }
}
