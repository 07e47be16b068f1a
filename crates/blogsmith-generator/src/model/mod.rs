//! The cross-referenced site model.
//!
//! Posts and tags live in two arenas and refer to each other by index. A
//! model is built once per rebuild from freshly loaded records and never
//! mutated afterwards.

mod archive;
mod index;
mod jsonld;
pub mod projection;

use std::collections::{HashMap, HashSet};

use blogsmith_core::{
    Config, CoreError, Post, PostState, Result, Tag, Theme, build_url,
    config::{SortOrder, TagOrder},
    source::CONFIG_FILE,
};
use chrono::{DateTime, Utc};
use tracing::debug;

pub use archive::{Archive, ArchiveBucket};
pub use index::IndexPage;
pub use projection::{Feed, Profile, Robots, Sitemap, SitemapEntry};

/// Output path of the tag list page, without extension.
pub const TAGS_PAGE: &str = "tags";
/// Directory holding one page per tag.
pub const TAGS_DIR: &str = "tags";

/// Validated records, as handed over by the loader.
#[derive(Debug, Clone)]
pub struct SiteSource {
    pub config: Config,
    /// Tags in file order; `content` is already HTML.
    pub tags: Vec<Tag>,
    /// Posts in load order.
    pub posts: Vec<Post>,
    pub theme: Theme,
    /// Content of `profile.alternate`, when configured.
    pub profile_alternate: Option<String>,
}

/// A post with its resolved neighbours and tags.
#[derive(Debug, Clone)]
pub struct PostNode {
    pub post: Post,
    /// Output path, e.g. `hello.html`.
    pub path: String,
    pub permalink: String,
    /// Indices into [`SiteModel::tags`], in front matter order.
    pub tags: Vec<usize>,
    /// Front matter keywords, or the slugs and titles of the post's tags.
    pub keywords: String,
    /// schema.org `Blog` record, serialized.
    pub json_ld: String,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

/// A tag with the posts that reference it.
#[derive(Debug, Clone)]
pub struct TagNode {
    pub tag: Tag,
    pub path: String,
    pub permalink: String,
    /// Indices into [`SiteModel::posts`], in canonical order.
    pub posts: Vec<usize>,
    /// Latest `created` among referencing posts.
    pub created: Option<DateTime<Utc>>,
    /// Latest `modified` among referencing posts.
    pub modified: Option<DateTime<Utc>>,
}

/// Everything a rebuild renders.
#[derive(Debug, Clone)]
pub struct SiteModel {
    pub config: Config,
    pub theme: Theme,
    /// Page extension without the dot.
    pub ext: String,

    /// Posts in canonical order.
    pub posts: Vec<PostNode>,
    /// Tags in file order.
    pub tags: Vec<TagNode>,
    /// Display order of [`Self::tags`] per `tags.order`.
    pub tag_order: Vec<usize>,
    pub tags_path: String,
    pub tags_permalink: String,

    pub index: Vec<IndexPage>,
    pub archive: Option<Archive>,

    pub sitemap: Option<Sitemap>,
    pub rss: Option<Feed>,
    pub atom: Option<Feed>,
    pub robots: Option<Robots>,
    pub profile: Option<Profile>,

    /// Latest post `created`, or the epoch without posts.
    pub created: DateTime<Utc>,
    /// Latest post `modified`, or the epoch without posts.
    pub modified: DateTime<Utc>,
    pub built: DateTime<Utc>,
}

impl SiteModel {
    /// Cross-reference `source` into a model.
    ///
    /// Any unresolved tag or template aborts with a [`CoreError::Reference`]
    /// naming the post file.
    pub fn build(source: SiteSource, ext: &str, built: DateTime<Utc>) -> Result<Self> {
        let SiteSource {
            config,
            tags,
            posts,
            theme,
            profile_alternate,
        } = source;

        check_unique_slugs(&posts)?;
        for post in &posts {
            if !theme.has_template(&post.template) {
                return Err(CoreError::reference(
                    &post.path,
                    "template",
                    format!("not declared by theme {}", theme.id),
                    &post.template,
                ));
            }
        }

        let posts = sort_posts(posts);
        let mut nodes: Vec<PostNode> = posts
            .into_iter()
            .map(|post| {
                let path = page_path(&post.slug, ext);
                PostNode {
                    permalink: build_url(&config.url, &[&path]),
                    path,
                    post,
                    tags: Vec::new(),
                    keywords: String::new(),
                    json_ld: String::new(),
                    prev: None,
                    next: None,
                }
            })
            .collect();
        link_neighbours(&mut nodes);

        let mut tag_nodes: Vec<TagNode> = tags
            .into_iter()
            .map(|tag| {
                let path = format!("{TAGS_DIR}/{}", page_path(&tag.slug, ext));
                TagNode {
                    permalink: build_url(&config.url, &[&path]),
                    path,
                    tag,
                    posts: Vec::new(),
                    created: None,
                    modified: None,
                }
            })
            .collect();
        resolve_tags(&mut nodes, &mut tag_nodes)?;
        for node in &mut nodes {
            node.json_ld = jsonld::post_ld(&node.post, &node.keywords)?;
        }

        let created = nodes.iter().map(|n| n.post.created).max().unwrap_or(DateTime::UNIX_EPOCH);
        let modified = nodes.iter().map(|n| n.post.modified).max().unwrap_or(DateTime::UNIX_EPOCH);

        let tag_order = order_tags(&tag_nodes, config.tags.order, config.tags.order_by);
        let tags_path = page_path(TAGS_PAGE, ext);
        let tags_permalink = build_url(&config.url, &[&tags_path]);

        let index = index::paginate(&config, &nodes, ext);
        let archive = config
            .archive
            .as_ref()
            .map(|archive| archive::bucket(&config, archive, &nodes, ext));

        let profile = match &config.profile {
            Some(profile) => Some(projection::profile(profile, &nodes, profile_alternate)?),
            None => None,
        };

        let mut model = Self {
            config,
            theme,
            ext: ext.to_string(),
            posts: nodes,
            tags: tag_nodes,
            tag_order,
            tags_path,
            tags_permalink,
            index,
            archive,
            sitemap: None,
            rss: None,
            atom: None,
            robots: None,
            profile,
            created,
            modified,
            built,
        };

        model.sitemap = projection::sitemap(&model);
        model.rss = projection::feed(&model, model.config.rss.as_ref(), projection::RSS_FILE, model.theme.rss_xsl.as_deref());
        model.atom = projection::feed(
            &model,
            model.config.atom.as_ref(),
            projection::ATOM_FILE,
            model.theme.atom_xsl.as_deref(),
        );
        model.robots = projection::robots(&model);

        debug!(
            posts = model.posts.len(),
            tags = model.tags.len(),
            pages = model.index.len(),
            "built site model"
        );

        Ok(model)
    }

    /// Tags in display order.
    pub fn ordered_tags(&self) -> impl Iterator<Item = &TagNode> {
        self.tag_order.iter().map(|&i| &self.tags[i])
    }

    /// Look up a post by slug.
    #[must_use]
    pub fn post(&self, slug: &str) -> Option<&PostNode> {
        self.posts.iter().find(|p| p.post.slug == slug)
    }

    /// Look up a tag by slug.
    #[must_use]
    pub fn tag(&self, slug: &str) -> Option<&TagNode> {
        self.tags.iter().find(|t| t.tag.slug == slug)
    }

    /// Permalink of a file relative to the output root.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url(&self.config.url, &[path])
    }
}

/// `<name>.<ext>`
pub(crate) fn page_path(name: &str, ext: &str) -> String {
    format!("{name}.{ext}")
}

fn check_unique_slugs(posts: &[Post]) -> Result<()> {
    let mut seen = HashSet::with_capacity(posts.len());
    for post in posts {
        if !seen.insert(post.slug.as_str()) {
            return Err(CoreError::Validation(
                blogsmith_core::FieldError::new(&post.path, "slug", "duplicate post slug").with_value(&post.slug),
            ));
        }
    }
    Ok(())
}

fn state_rank(state: PostState) -> u8 {
    match state {
        PostState::Top => 0,
        PostState::Last => 2,
        PostState::Draft | PostState::Default => 1,
    }
}

/// Canonical order: `top` first, `last` last, otherwise newest first.
///
/// The sort is stable, so equal keys keep load order.
pub(crate) fn sort_posts(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| {
        state_rank(a.state)
            .cmp(&state_rank(b.state))
            .then_with(|| b.created.cmp(&a.created))
    });
    posts
}

fn link_neighbours(nodes: &mut [PostNode]) {
    let len = nodes.len();
    for (i, node) in nodes.iter_mut().enumerate() {
        node.prev = i.checked_sub(1);
        node.next = (i + 1 < len).then_some(i + 1);
    }
}

fn resolve_tags(posts: &mut [PostNode], tags: &mut [TagNode]) -> Result<()> {
    let by_slug: HashMap<String, usize> = tags
        .iter()
        .enumerate()
        .map(|(i, t)| (t.tag.slug.clone(), i))
        .collect();

    for (pi, node) in posts.iter_mut().enumerate() {
        for slug in &node.post.tags {
            let Some(&ti) = by_slug.get(slug) else {
                return Err(CoreError::reference(&node.post.path, "tags", "unknown tag", slug));
            };

            // A slug listed twice still links once.
            if node.tags.contains(&ti) {
                continue;
            }
            node.tags.push(ti);

            let tag = &mut tags[ti];
            tag.posts.push(pi);
            tag.created = tag.created.max(Some(node.post.created));
            tag.modified = tag.modified.max(Some(node.post.modified));
        }

        node.keywords = match &node.post.keywords {
            Some(keywords) if !keywords.trim().is_empty() => keywords.clone(),
            _ => derive_keywords(&node.tags, tags),
        };
    }

    Ok(())
}

fn derive_keywords(indices: &[usize], tags: &[TagNode]) -> String {
    let mut words: Vec<&str> = Vec::with_capacity(indices.len() * 2);
    for &i in indices {
        for word in [tags[i].tag.slug.as_str(), tags[i].tag.title.as_str()] {
            if !words.contains(&word) {
                words.push(word);
            }
        }
    }
    words.join(",")
}

fn order_tags(tags: &[TagNode], order: TagOrder, by: SortOrder) -> Vec<usize> {
    let mut order_list: Vec<usize> = (0..tags.len()).collect();
    if order == TagOrder::Size {
        order_list.sort_by(|&a, &b| {
            let (a, b) = (tags[a].posts.len(), tags[b].posts.len());
            match by {
                SortOrder::Asc => a.cmp(&b),
                SortOrder::Desc => b.cmp(&a),
            }
        });
    }
    order_list
}

/// Error for a configured file the loader could not supply.
pub(crate) fn missing_config_file(field: &str, path: &str) -> CoreError {
    CoreError::reference(CONFIG_FILE, field, "file not found", path)
}
