//! Record loading.
//!
//! Reads the configuration, tags, posts and theme from a [`ContentSource`]
//! and validates each record on its own. Cross-referencing is left to
//! [`SiteModel::build`](crate::model::SiteModel::build).

use std::sync::Arc;

use blogsmith_core::{
    Config, ContentSource, CoreError, FieldError, Post,
    config::{ProfileConfig, is_url},
    source::{CONFIG_FILE, POSTS_DIR, TAGS_FILE},
    tag::load_tags,
    theme::load_theme,
};
use blogsmith_parser::ContentParser;
use tracing::{debug, info};

use crate::{
    build::{BuildError, Result},
    model::SiteSource,
};

/// Loads every record a build needs.
pub struct SiteLoader {
    parser: Arc<dyn ContentParser>,
    base_url: Option<String>,
    preview: bool,
}

impl SiteLoader {
    #[must_use]
    pub fn new(parser: Arc<dyn ContentParser>) -> Self {
        Self {
            parser,
            base_url: None,
            preview: false,
        }
    }

    /// Replace `conf.yaml`'s `url` after loading.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url.filter(|u| !u.is_empty());
        self
    }

    /// Keep draft posts.
    #[must_use]
    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn load(&self, source: &dyn ContentSource) -> Result<SiteSource> {
        let config = self.load_config(source)?;
        let tags = self.load_tags(source)?;
        let posts = self.load_posts(source, &config)?;
        let theme = load_theme(source, &config.theme)?;

        let profile_alternate = match &config.profile {
            Some(ProfileConfig::Alternate { path }) if source.exists(path) => Some(source.read_to_string(path)?),
            _ => None,
        };

        info!(posts = posts.len(), tags = tags.len(), theme = %theme.id, "loaded site records");

        Ok(SiteSource {
            config,
            tags,
            posts,
            theme,
            profile_alternate,
        })
    }

    fn load_config(&self, source: &dyn ContentSource) -> Result<Config> {
        let text = source.read_to_string(CONFIG_FILE)?;
        let mut config = Config::from_yaml(&text)?;

        if let Some(url) = &self.base_url {
            if !is_url(url) {
                return Err(CoreError::Validation(
                    FieldError::new(CONFIG_FILE, "url", "base URL override is not a valid URL").with_value(url),
                )
                .into());
            }
            debug!(url = %url, "overriding site URL");
            config.url = url.clone();
        }

        Ok(config)
    }

    /// Tags with their markdown content converted to HTML.
    fn load_tags(&self, source: &dyn ContentSource) -> Result<Vec<blogsmith_core::Tag>> {
        let text = source.read_to_string(TAGS_FILE)?;
        let mut tags = load_tags(&text)?;

        for tag in &mut tags {
            let (html, _) = self
                .parser
                .parse_fragment(&tag.content)
                .map_err(|source| BuildError::Parser {
                    path: format!("{TAGS_FILE}#{}", tag.slug),
                    source,
                })?;
            tag.content = html;
        }

        Ok(tags)
    }

    fn load_posts(&self, source: &dyn ContentSource, config: &Config) -> Result<Vec<Post>> {
        let mut posts = Vec::new();

        for path in source.list(POSTS_DIR)? {
            if !is_markdown(&path) {
                continue;
            }

            let text = source.read_to_string(&path)?;
            let parsed = self
                .parser
                .parse(&text, &path)
                .map_err(|source| BuildError::Parser {
                    path: path.clone(),
                    source,
                })?;
            let post = Post::from_parsed(&path, parsed, config)?;

            if post.is_draft() && !self.preview {
                debug!(path = %path, "skipping draft");
                continue;
            }
            posts.push(post);
        }

        Ok(posts)
    }
}

fn is_markdown(path: &str) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("md"))
}

#[cfg(test)]
mod tests {
    use blogsmith_core::MemorySource;
    use blogsmith_parser::MarkdownParser;

    use super::*;

    const CONF: &str = "title: Test\nurl: https://example.com\ntheme: default\nuptime: 2020-01-01T00:00:00Z\n\
                        author:\n  name: alice\nlicense:\n  url: https://example.com/license\n  text: MIT\n";
    const TAGS: &str = "- slug: rust\n  title: Rust\n  content: All things *Rust*.\n";

    fn post(title: &str, state: &str) -> String {
        format!("---\ntitle: {title}\ncreated: 2024-01-01\ntags: [rust]\nstate: {state}\n---\n\nBody of {title}.\n")
    }

    fn site() -> MemorySource {
        MemorySource::new()
            .with("conf.yaml", CONF)
            .and_then(|s| s.with("tags.yaml", TAGS))
            .and_then(|s| s.with("themes/default/theme.yaml", ""))
            .and_then(|s| s.with("posts/hello.md", post("Hello", "default")))
            .and_then(|s| s.with("posts/wip.md", post("Wip", "draft")))
            .and_then(|s| s.with("posts/image.png", "binary"))
            .expect("source")
    }

    fn loader() -> SiteLoader {
        SiteLoader::new(Arc::new(MarkdownParser::new()))
    }

    #[test]
    fn test_load_site() {
        let loaded = loader().load(&site()).expect("load");

        assert_eq!(loaded.config.title, "Test");
        assert_eq!(loaded.tags[0].content, "<p>All things <em>Rust</em>.</p>\n");
        assert_eq!(loaded.posts.len(), 1);
        assert_eq!(loaded.posts[0].slug, "posts/hello");
        assert_eq!(loaded.theme.id, "default");
        assert!(loaded.profile_alternate.is_none());
    }

    #[test]
    fn test_preview_keeps_drafts() {
        let loaded = loader().with_preview(true).load(&site()).expect("load");
        let slugs: Vec<_> = loaded.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["posts/hello", "posts/wip"]);
    }

    #[test]
    fn test_base_url_override() {
        let loaded = loader()
            .with_base_url(Some("http://localhost:8080/".to_string()))
            .load(&site())
            .expect("load");
        assert_eq!(loaded.config.url, "http://localhost:8080/");

        let err = loader()
            .with_base_url(Some("not a url".to_string()))
            .load(&site())
            .err()
            .expect("invalid override");
        assert!(matches!(err, BuildError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn test_post_validation_error_names_file() {
        let mut source = site();
        source
            .insert("posts/broken.md", "---\ntitle: Broken\ncreated: 2024-01-01\n---\nno tags")
            .expect("insert");

        let err = loader().load(&source).err().expect("missing tags");
        let BuildError::Core(core) = err else {
            panic!("unexpected error: {err}");
        };
        let field = core.field_error().expect("field error");
        assert_eq!(field.file, "posts/broken.md");
        assert_eq!(field.field, "tags");
    }

    #[test]
    fn test_missing_config() {
        let source = MemorySource::new();
        let err = loader().load(&source).err().expect("no config");
        assert!(matches!(err, BuildError::Core(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_profile_alternate() {
        let source = MemorySource::new()
            .with("conf.yaml", format!("{CONF}profile:\n  alternate: about.md\n"))
            .and_then(|s| s.with("tags.yaml", TAGS))
            .and_then(|s| s.with("themes/default/theme.yaml", ""))
            .and_then(|s| s.with("about.md", "# About me\n"))
            .expect("source");

        let loaded = loader().load(&source).expect("load");
        assert_eq!(loaded.profile_alternate.as_deref(), Some("# About me\n"));
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown("posts/a.md"));
        assert!(is_markdown("posts/B.MD"));
        assert!(!is_markdown("posts/a.png"));
        assert!(!is_markdown("posts/md"));
    }
}
