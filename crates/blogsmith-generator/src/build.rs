//! Build orchestration.
//!
//! A [`Builder`] owns one source, one writer and the rebuild lock. Every
//! rebuild loads the records afresh, renders the whole site into memory and
//! only then replaces what the writer holds, so a failed rebuild leaves the
//! previous output in place.

use std::{
    sync::{Arc, Mutex, PoisonError, RwLock, TryLockError},
    time::Instant,
};

use blogsmith_core::{ContentSource, CoreError, source::THEMES_DIR, url::theme_path};
use blogsmith_parser::{ContentParser, ParserError};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{Span, debug, info, warn};

use crate::{
    atom,
    html::{HtmlError, HtmlGenerator},
    loader::SiteLoader,
    model::{SiteModel, projection},
    output::{OutputError, OutputWriter},
    profile, robots, rss, sitemap,
    template::{TemplateError, TemplateRegistry},
    xml::XmlError,
};

/// Extensions never copied from the source tree.
const IGNORED_EXTENSIONS: &[&str] = &["md", "yaml", "yml"];

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Another rebuild holds the lock. Retry later.
    #[error("a build is already in progress")]
    Building,

    /// Invalid or unreadable source records.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The markdown engine rejected a file.
    #[error("failed to parse {path}: {source}")]
    Parser {
        path: String,
        #[source]
        source: ParserError,
    },

    /// A template failed for one page.
    #[error("failed to render {page}: {message}")]
    Render { page: String, message: String },

    /// The output writer failed.
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Feed encoding failed.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),
}

impl BuildError {
    /// Whether this is the "build in progress" sentinel.
    #[must_use]
    pub fn is_building(&self) -> bool {
        matches!(self, Self::Building)
    }
}

impl From<HtmlError> for BuildError {
    fn from(err: HtmlError) -> Self {
        Self::Render {
            page: err.page,
            message: err.source.to_string(),
        }
    }
}

impl From<TemplateError> for BuildError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::Source(core) => Self::Core(core),
            other => Self::Render {
                page: THEMES_DIR.to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Runtime options that do not come from `conf.yaml`.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Replaces the configured site URL.
    pub base_url: Option<String>,
    /// Include draft posts.
    pub preview: bool,
    /// Page extension without the dot.
    pub ext: String,
    /// Source path prefixes left out of the asset copy, e.g. an output
    /// directory nested inside the source tree.
    pub exclude: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            preview: false,
            ext: "html".to_string(),
            exclude: Vec::new(),
        }
    }
}

/// Build statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub posts: usize,
    pub tags: usize,
    /// HTML pages rendered.
    pub pages: usize,
    /// Files copied verbatim from the source tree.
    pub assets: usize,
    /// Every file written, pages and assets included.
    pub files: usize,
    pub duration_ms: u64,
}

/// Everything one rebuild will write, in write order.
#[derive(Debug, Default)]
struct Staged {
    files: Vec<(String, Vec<u8>)>,
    stats: BuildStats,
}

impl Staged {
    fn push(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.push((path.into(), bytes.into()));
    }
}

/// Site builder; the synchronous half of the rebuild coordinator.
pub struct Builder {
    source: Arc<dyn ContentSource>,
    writer: Arc<dyn OutputWriter>,
    parser: Arc<dyn ContentParser>,
    options: BuildOptions,
    lock: Mutex<()>,
    last_built: RwLock<Option<DateTime<Utc>>>,
    span: Option<Span>,
}

impl Builder {
    #[must_use]
    pub fn new(
        source: Arc<dyn ContentSource>,
        writer: Arc<dyn OutputWriter>,
        parser: Arc<dyn ContentParser>,
        options: BuildOptions,
    ) -> Self {
        Self {
            source,
            writer,
            parser,
            options,
            lock: Mutex::new(()),
            last_built: RwLock::new(None),
            span: None,
        }
    }

    /// Enter `span` for the duration of every rebuild.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    #[must_use]
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    #[must_use]
    pub fn writer(&self) -> &Arc<dyn OutputWriter> {
        &self.writer
    }

    /// Completion time of the last successful rebuild.
    #[must_use]
    pub fn last_built(&self) -> Option<DateTime<Utc>> {
        *self.last_built.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Regenerate the whole site.
    ///
    /// Returns [`BuildError::Building`] at once if another rebuild is running.
    pub fn rebuild(&self) -> Result<BuildStats> {
        let _guard = match self.lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                warn!("rebuild rejected: a build is already in progress");
                return Err(BuildError::Building);
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        let _entered = self.span.as_ref().map(Span::enter);

        let start = Instant::now();
        let Staged { files, mut stats } = self.stage(Utc::now())?;

        self.writer.reset()?;
        for (path, bytes) in &files {
            self.writer.write_file(path, bytes)?;
            debug!(path = %path, bytes = bytes.len(), "wrote file");
        }

        stats.files = files.len();
        stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        *self.last_built.write().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

        info!(
            posts = stats.posts,
            tags = stats.tags,
            pages = stats.pages,
            assets = stats.assets,
            files = stats.files,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Load, cross-reference and render without writing anything.
    pub fn check(&self) -> Result<SiteModel> {
        let (model, registry) = self.model(Utc::now())?;
        HtmlGenerator::new(&model, &registry).generate_all()?;
        Ok(model)
    }

    fn model(&self, built: DateTime<Utc>) -> Result<(SiteModel, TemplateRegistry)> {
        let source = self.source.as_ref();
        let site = SiteLoader::new(Arc::clone(&self.parser))
            .with_base_url(self.options.base_url.clone())
            .with_preview(self.options.preview)
            .load(source)?;

        let registry = TemplateRegistry::from_theme(source, &site.theme)?;
        let model = SiteModel::build(site, &self.options.ext, built)?;
        Ok((model, registry))
    }

    fn stage(&self, built: DateTime<Utc>) -> Result<Staged> {
        let (model, registry) = self.model(built)?;
        let mut staged = Staged::default();
        staged.stats.posts = model.posts.len();
        staged.stats.tags = model.tags.len();

        for path in self.source.list("")? {
            if is_ignored(&path) || self.is_excluded(&path) {
                continue;
            }
            let bytes = self.source.read(&path)?;
            staged.push(path, bytes);
            staged.stats.assets += 1;
        }

        for highlight in &model.theme.highlights {
            let path = theme_path(&model.theme.id, &format!("{}.css", highlight.name));
            if self.source.exists(&path) {
                continue;
            }
            match self.parser.highlight_stylesheet(&highlight.name) {
                Some(css) => staged.push(path, css),
                None => warn!(name = %highlight.name, "no stylesheet for highlight theme"),
            }
        }

        let pages = HtmlGenerator::new(&model, &registry).generate_all()?;
        staged.stats.pages = pages.len();
        for page in pages {
            staged.push(page.path, page.html);
        }

        if let Some(map) = &model.sitemap {
            staged.push(projection::SITEMAP_FILE, sitemap::render(map));
        }
        if let Some(feed) = &model.rss {
            staged.push(feed.path, rss::render(&model, feed)?);
        }
        if let Some(feed) = &model.atom {
            staged.push(feed.path, atom::render(&model, feed)?);
        }
        if let Some(rules) = &model.robots {
            staged.push(projection::ROBOTS_FILE, robots::render(rules));
        }
        if let Some(readme) = &model.profile {
            staged.push(projection::PROFILE_FILE, profile::render(&model, readme));
        }

        Ok(staged)
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.options.exclude.iter().any(|prefix| {
            let prefix = prefix.trim_matches('/');
            !prefix.is_empty()
                && path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

/// Whether a source file stays out of the verbatim copy.
///
/// Hidden files, theme layout templates, markdown and YAML are skipped,
/// except the theme descriptors themselves. Files nested below a layout
/// directory are copied.
#[must_use]
pub fn is_ignored(path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').collect();

    if segments.iter().any(|s| s.starts_with('.')) {
        return true;
    }

    if segments.len() >= 3 && segments[0] == THEMES_DIR {
        if segments.len() == 3 && segments[2] == blogsmith_core::source::THEME_FILE {
            return false;
        }
        // Only direct children of a layout directory are templates.
        if segments.len() == 4 && segments[2] == blogsmith_core::source::LAYOUT_DIR {
            return true;
        }
    }

    segments
        .last()
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(_, ext)| IGNORED_EXTENSIONS.iter().any(|i| ext.eq_ignore_ascii_case(i)))
}

#[cfg(test)]
mod tests {
    use blogsmith_core::MemorySource;
    use blogsmith_parser::MarkdownParser;

    use super::*;
    use crate::output::MemoryWriter;

    const CONF: &str = "title: Test\nurl: https://example.com\ntheme: default\nuptime: 2020-01-01T00:00:00Z\n\
                        author:\n  name: alice\nlicense:\n  url: https://example.com/license\n  text: MIT\n\
                        sitemap:\n  enable_tag: true\nrobots:\n  - agent: ['*']\n    allow: ['/']\n";

    fn site() -> MemorySource {
        MemorySource::new()
            .with("conf.yaml", CONF)
            .and_then(|s| s.with("tags.yaml", "- slug: rust\n  title: Rust\n  content: Rust\n"))
            .and_then(|s| {
                s.with(
                    "themes/default/theme.yaml",
                    "highlights:\n  - name: base16-ocean.dark\n  - name: missing-scheme\n    media: print\n",
                )
            })
            .and_then(|s| s.with("themes/default/style.css", "body{}"))
            .and_then(|s| s.with("themes/default/layout/post.html", "<article>{{ content }}</article>"))
            .and_then(|s| s.with("posts/hello.md", "---\ntitle: Hello\ncreated: 2024-01-01\ntags: [rust]\n---\nHi."))
            .and_then(|s| s.with("posts/hello/cover.png", "png"))
            .and_then(|s| s.with(".git/config", "x"))
            .expect("source")
    }

    fn builder(source: MemorySource, writer: &MemoryWriter) -> Builder {
        Builder::new(
            Arc::new(source),
            Arc::new(writer.clone()),
            Arc::new(MarkdownParser::new()),
            BuildOptions::default(),
        )
    }

    #[test]
    fn test_is_ignored() {
        assert!(is_ignored("posts/hello.md"));
        assert!(is_ignored("conf.yaml"));
        assert!(is_ignored("tags.yml"));
        assert!(is_ignored(".gitignore"));
        assert!(is_ignored(".git/HEAD"));
        assert!(is_ignored("themes/default/.hidden.css"));
        assert!(is_ignored("themes/default/layout/post.html"));
        assert!(!is_ignored("themes/default/layout/img/bg.png"));
        assert!(is_ignored("themes/default/layout/partials/nav.md"));
        assert!(!is_ignored("themes/default/theme.yaml"));
        assert!(is_ignored("themes/default/partials/theme.yaml"));
        assert!(!is_ignored("themes/default/style.css"));
        assert!(!is_ignored("posts/hello/cover.png"));
        assert!(!is_ignored("CNAME"));
    }

    #[test]
    fn test_rebuild_writes_site() {
        let writer = MemoryWriter::new();
        let builder = builder(site(), &writer);
        assert!(builder.last_built().is_none());

        let stats = builder.rebuild().expect("rebuild");

        assert_eq!(stats.posts, 1);
        assert_eq!(stats.tags, 1);
        assert_eq!(stats.files, writer.paths().len());
        assert!(builder.last_built().is_some());

        let paths = writer.paths();
        for expected in [
            "index.html",
            "tags.html",
            "tags/rust.html",
            "posts/hello.html",
            "sitemap.xml",
            "robots.txt",
            "posts/hello/cover.png",
            "themes/default/style.css",
            "themes/default/theme.yaml",
            "themes/default/base16-ocean.dark.css",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}: {paths:?}");
        }
        for absent in [
            "conf.yaml",
            "posts/hello.md",
            ".git/config",
            "themes/default/layout/post.html",
            "themes/default/missing-scheme.css",
        ] {
            assert!(!paths.iter().any(|p| p == absent), "unexpected {absent}");
        }

        let post = String::from_utf8(writer.read_file("posts/hello.html").expect("post")).expect("utf8");
        assert!(post.contains("<article><p>Hi.</p>\n</article>"));
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_output() {
        let writer = MemoryWriter::new();
        builder(site(), &writer).rebuild().expect("first build");
        let before = writer.paths();

        let mut broken = site();
        broken
            .insert("posts/bad.md", "---\ntitle: Bad\ncreated: 2024-01-01\ntags: [nope]\n---\n")
            .expect("insert");
        let err = builder(broken, &writer).rebuild().unwrap_err();

        assert!(matches!(err, BuildError::Core(CoreError::Reference(_))));
        assert_eq!(writer.paths(), before);
    }

    #[test]
    fn test_exclude_prefix() {
        let writer = MemoryWriter::new();
        let mut source = site();
        source.insert("public/index.html", "stale").expect("insert");

        let builder = Builder::new(
            Arc::new(source),
            Arc::new(writer.clone()),
            Arc::new(MarkdownParser::new()),
            BuildOptions {
                exclude: vec!["public/".to_string()],
                ..BuildOptions::default()
            },
        );
        builder.rebuild().expect("rebuild");
        assert!(!writer.paths().iter().any(|p| p.starts_with("public/")));
    }

    #[test]
    fn test_check_does_not_write() {
        let writer = MemoryWriter::new();
        let model = builder(site(), &writer).check().expect("check");
        assert_eq!(model.posts.len(), 1);
        assert!(writer.paths().is_empty());
    }

    #[test]
    fn test_building_sentinel() {
        assert!(BuildError::Building.is_building());
        assert!(!BuildError::Render {
            page: "x".to_string(),
            message: "y".to_string()
        }
        .is_building());
    }
}
