//! HTML generation from the site model.
//!
//! Every page is an inner template wrapped by `base`. Lists, links and
//! pagination are assembled here as HTML fragments so the templates stay
//! free of control flow.

use blogsmith_core::{TocEntry, url::theme_url};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::{
    model::{IndexPage, PostNode, SiteModel, TagNode},
    template::{Renderer, TemplateContext, TemplateError},
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A page failed to render.
#[derive(Debug, Error)]
#[error("failed to render {page}: {source}")]
pub struct HtmlError {
    /// Output path of the page.
    pub page: String,
    #[source]
    pub source: TemplateError,
}

/// Result type for HTML generation.
pub type Result<T> = std::result::Result<T, HtmlError>;

/// One rendered HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub path: String,
    pub html: String,
}

/// HTML page generator.
pub struct HtmlGenerator<'a> {
    model: &'a SiteModel,
    renderer: &'a dyn Renderer,
}

impl<'a> HtmlGenerator<'a> {
    #[must_use]
    pub fn new(model: &'a SiteModel, renderer: &'a dyn Renderer) -> Self {
        Self { model, renderer }
    }

    /// Render every HTML page: index pages, tag pages, posts, then the archive.
    pub fn generate_all(&self) -> Result<Vec<RenderedPage>> {
        let model = self.model;
        let mut pages = Vec::with_capacity(model.index.len() + model.tags.len() + model.posts.len() + 2);

        for page in &model.index {
            pages.push(self.generate_index_page(page)?);
        }

        pages.push(self.generate_tags_page()?);
        for tag in model.ordered_tags() {
            pages.push(self.generate_tag_page(tag)?);
        }

        for node in &model.posts {
            pages.push(self.generate_post_page(node)?);
        }

        if model.archive.is_some() {
            pages.push(self.generate_archive_page()?);
        }

        debug!(count = pages.len(), "rendered HTML pages");
        Ok(pages)
    }

    pub fn generate_index_page(&self, page: &IndexPage) -> Result<RenderedPage> {
        let posts = &self.model.posts[page.posts.clone()];
        let mut ctx = TemplateContext::new().with_var("posts", self.post_list_html(posts.iter()));
        ctx.insert_opt("pagination", self.pagination_html(page));
        ctx.insert("page_title", escape_html(&page.title));

        let base = self.base_context(&page.title, &page.permalink);
        self.wrap("index", &page.path, ctx, base)
    }

    pub fn generate_tags_page(&self) -> Result<RenderedPage> {
        let model = self.model;
        let title = non_empty(&model.config.tags.title, "Tags");

        let mut list = String::from("<ul class=\"tag-list\">");
        for tag in model.ordered_tags() {
            list.push_str(&format!(
                r#"<li><a href="{}"{}>{}</a> <span class="count">{}</span></li>"#,
                escape_html(&tag.permalink),
                color_style(tag),
                escape_html(&tag.tag.title),
                tag.posts.len()
            ));
        }
        list.push_str("</ul>");

        let ctx = TemplateContext::new()
            .with_var("page_title", escape_html(title))
            .with_var("tags", list);
        let base = self.base_context(title, &model.tags_permalink);
        self.wrap("tags", &model.tags_path, ctx, base)
    }

    pub fn generate_tag_page(&self, tag: &TagNode) -> Result<RenderedPage> {
        let posts = tag.posts.iter().map(|&i| &self.model.posts[i]);
        let ctx = TemplateContext::new()
            .with_var("page_title", escape_html(&tag.tag.title))
            .with_var("tag_content", tag.tag.content.clone())
            .with_var("posts", self.post_list_html(posts));

        let mut base = self.base_context(&tag.tag.title, &tag.permalink);
        let keywords = tag
            .tag
            .keywords
            .clone()
            .unwrap_or_else(|| format!("{},{}", tag.tag.slug, tag.tag.title));
        base.insert("keywords", escape_html(&keywords));
        self.wrap("tag", &tag.path, ctx, base)
    }

    pub fn generate_post_page(&self, node: &PostNode) -> Result<RenderedPage> {
        let model = self.model;
        let post = &node.post;

        let mut ctx = TemplateContext::new()
            .with_var("page_title", escape_html(&post.title))
            .with_var("created", format_date(post.created))
            .with_var("created_iso", post.created.to_rfc3339())
            .with_var("modified", format_date(post.modified))
            .with_var("modified_iso", post.modified.to_rfc3339())
            .with_var("summary", escape_html(&post.summary))
            .with_var("content", post.content.clone())
            .with_var("json_ld", node.json_ld.clone())
            .with_var("license", link_html(&post.license.url, &post.license.text))
            .with_var(
                "authors",
                post.authors
                    .iter()
                    .map(|a| match &a.url {
                        Some(url) => link_html(url, &a.name),
                        None => escape_html(&a.name),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
            );

        if !node.tags.is_empty() {
            let tags = node
                .tags
                .iter()
                .map(|&t| {
                    let tag = &model.tags[t];
                    format!(
                        r#"<a class="tag" href="{}"{}>{}</a>"#,
                        escape_html(&tag.permalink),
                        color_style(tag),
                        escape_html(&tag.tag.title)
                    )
                })
                .collect::<String>();
            ctx.insert("tags", tags);
        }

        if model.config.toc > 0 && post.toc.len() >= model.config.toc {
            ctx.insert("toc", toc_html(&post.toc));
        }
        ctx.insert_opt("image", post.image.as_deref().map(escape_html));
        ctx.insert_opt("prev", node.prev.map(|i| neighbour_html("prev", &model.posts[i])));
        ctx.insert_opt("next", node.next.map(|i| neighbour_html("next", &model.posts[i])));

        let mut base = self.base_context(&post.title, &node.permalink);
        base.insert("lang", escape_html(&post.language));
        base.insert("description", escape_html(&post.summary));
        base.insert("keywords", escape_html(&node.keywords));
        base.insert(
            "head",
            format!(
                r#"{}<script type="application/ld+json">{}</script>"#,
                self.head_html(),
                node.json_ld
            ),
        );
        self.wrap(&post.template, &node.path, ctx, base)
    }

    pub fn generate_archive_page(&self) -> Result<RenderedPage> {
        let model = self.model;
        let Some(archive) = &model.archive else {
            return Err(HtmlError {
                page: "archive".to_string(),
                source: TemplateError::NotFound("archive".to_string()),
            });
        };
        let title = non_empty(&archive.title, "Archive");

        let mut html = String::new();
        for bucket in &archive.buckets {
            html.push_str(&format!(
                r#"<section class="archive-bucket"><h2>{}</h2>{}</section>"#,
                escape_html(&bucket.title),
                self.post_list_html(bucket.posts.iter().map(|&i| &model.posts[i]))
            ));
        }

        let ctx = TemplateContext::new()
            .with_var("page_title", escape_html(title))
            .with_var("archives", html);

        let mut base = self.base_context(title, &archive.permalink);
        base.insert_opt("keywords", archive.keywords.as_deref().map(escape_html));
        base.insert_opt("description", archive.description.as_deref().map(escape_html));
        self.wrap("archive", &archive.path, ctx, base)
    }

    /// Render `inner`, then frame it with `base`.
    fn wrap(
        &self,
        inner: &str,
        path: &str,
        ctx: TemplateContext,
        mut base: TemplateContext,
    ) -> Result<RenderedPage> {
        let err = |source| HtmlError {
            page: path.to_string(),
            source,
        };

        let content = self.renderer.render(inner, &ctx).map_err(err)?;
        base.insert("content", content);
        let html = self.renderer.render("base", &base).map_err(err)?;

        Ok(RenderedPage {
            path: path.to_string(),
            html,
        })
    }

    fn base_context(&self, page_title: &str, canonical: &str) -> TemplateContext {
        let model = self.model;
        let config = &model.config;

        let mut ctx = TemplateContext::new()
            .with_var("lang", escape_html(&config.language))
            .with_var("title", escape_html(&self.full_title(page_title)))
            .with_var("site_title", escape_html(&config.title))
            .with_var("site_url", escape_html(&config.url))
            .with_var("canonical_url", escape_html(canonical))
            .with_var("head", self.head_html())
            .with_var("footer", self.footer_html());
        ctx.insert_opt("subtitle", config.subtitle.as_deref().map(escape_html));
        ctx.insert_opt("description", config.description.as_deref().map(escape_html));
        ctx.insert_opt("keywords", config.keywords.as_deref().map(escape_html));

        if !config.menus.is_empty() {
            let menus = config
                .menus
                .iter()
                .map(|m| link_html(&m.url, &m.text))
                .collect::<Vec<_>>()
                .join(" ");
            ctx.insert("menus", menus);
        }

        ctx
    }

    /// `page | site`, or just the site title for the home page.
    fn full_title(&self, page_title: &str) -> String {
        let config = &self.model.config;
        if page_title.is_empty() || page_title == config.title {
            return config.title.clone();
        }
        match &config.title_separator {
            Some(sep) => format!("{page_title}{sep}{}", config.title),
            None => page_title.to_string(),
        }
    }

    fn head_html(&self) -> String {
        let model = self.model;
        let config = &model.config;
        let mut head = String::new();

        if let Some(icon) = &config.icon {
            head.push_str(&format!(r#"<link rel="icon" href="{}""#, escape_html(&icon.url)));
            if let Some(t) = &icon.mime_type {
                head.push_str(&format!(r#" type="{}""#, escape_html(t)));
            }
            if let Some(sizes) = &icon.sizes {
                head.push_str(&format!(r#" sizes="{}""#, escape_html(sizes)));
            }
            head.push('>');
        }

        for highlight in &model.theme.highlights {
            let href = theme_url(&config.url, &model.theme.id, &[&format!("{}.css", highlight.name)]);
            head.push_str(&format!(r#"<link rel="stylesheet" href="{}""#, escape_html(&href)));
            if let Some(media) = highlight.media.as_deref().filter(|m| !m.is_empty()) {
                head.push_str(&format!(r#" media="{}""#, escape_html(media)));
            }
            head.push('>');
        }

        for (feed, mime) in [(&model.rss, "application/rss+xml"), (&model.atom, "application/atom+xml")] {
            if let Some(feed) = feed {
                head.push_str(&format!(
                    r#"<link rel="alternate" type="{mime}" title="{}" href="{}">"#,
                    escape_html(&feed.title),
                    escape_html(&feed.permalink)
                ));
            }
        }

        head
    }

    fn footer_html(&self) -> String {
        let config = &self.model.config;
        let author = match &config.author.url {
            Some(url) => link_html(url, &config.author.name),
            None => escape_html(&config.author.name),
        };
        format!(
            "&copy; {}-{} {author} · {}",
            config.uptime.format("%Y"),
            self.model.modified.max(config.uptime).format("%Y"),
            link_html(&config.license.url, &config.license.text)
        )
    }

    fn post_list_html<'p>(&self, posts: impl Iterator<Item = &'p PostNode>) -> String {
        let mut html = String::from("<ul class=\"post-list\">");
        for node in posts {
            html.push_str(&format!(
                r#"<li class="post-item"><a href="{}">{}</a> <time datetime="{}">{}</time><p>{}</p></li>"#,
                escape_html(&node.permalink),
                escape_html(&node.post.title),
                node.post.created.to_rfc3339(),
                format_date(node.post.created),
                escape_html(&node.post.summary)
            ));
        }
        html.push_str("</ul>");
        html
    }

    fn pagination_html(&self, page: &IndexPage) -> Option<String> {
        if page.prev.is_none() && page.next.is_none() {
            return None;
        }

        let mut html = String::from("<nav class=\"pagination\">");
        if let Some(prev) = page.prev {
            html.push_str(&format!(
                r#"<a class="prev" rel="prev" href="{}">&laquo;</a>"#,
                escape_html(&self.model.index[prev].permalink)
            ));
        }
        html.push_str(&format!(r#"<span class="current">{}</span>"#, page.number));
        if let Some(next) = page.next {
            html.push_str(&format!(
                r#"<a class="next" rel="next" href="{}">&raquo;</a>"#,
                escape_html(&self.model.index[next].permalink)
            ));
        }
        html.push_str("</nav>");
        Some(html)
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn non_empty<'s>(value: &'s str, fallback: &'s str) -> &'s str {
    if value.trim().is_empty() { fallback } else { value }
}

fn color_style(tag: &TagNode) -> String {
    tag.tag
        .color
        .as_deref()
        .map(|c| format!(r#" style="color:{}""#, escape_html(c)))
        .unwrap_or_default()
}

fn link_html(url: &str, text: &str) -> String {
    format!(r#"<a href="{}">{}</a>"#, escape_html(url), escape_html(text))
}

fn neighbour_html(rel: &str, node: &PostNode) -> String {
    format!(
        r#"<a class="{rel}" rel="{rel}" href="{}">{}</a>"#,
        escape_html(&node.permalink),
        escape_html(&node.post.title)
    )
}

/// Nested `<ul>` following heading levels.
fn toc_html(toc: &[TocEntry]) -> String {
    let Some(base) = toc.iter().map(|t| t.level).min() else {
        return String::new();
    };

    let mut html = String::from("<nav class=\"toc\">");
    let mut depth = 0usize;
    for entry in toc {
        let level = usize::from(entry.level - base) + 1;
        while depth < level {
            html.push_str("<ul>");
            depth += 1;
        }
        while depth > level {
            html.push_str("</ul>");
            depth -= 1;
        }
        html.push_str(&format!(
            r##"<li><a href="#{}">{}</a></li>"##,
            escape_html(&entry.id),
            escape_html(&entry.text)
        ));
    }
    for _ in 0..depth {
        html.push_str("</ul>");
    }
    html.push_str("</nav>");
    html
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
