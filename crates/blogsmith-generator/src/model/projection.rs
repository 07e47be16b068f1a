//! Optional derived outputs: sitemap, feeds, robots and profile.

use blogsmith_core::{
    CoreError,
    config::{Agent, ChangeFreq, FeedConfig, ProfileConfig},
    url::theme_url,
};
use chrono::{DateTime, Utc};

use super::{PostNode, SiteModel, missing_config_file};

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const RSS_FILE: &str = "rss.xml";
pub const ATOM_FILE: &str = "atom.xml";
pub const ROBOTS_FILE: &str = "robots.txt";
pub const PROFILE_FILE: &str = "README.md";

/// `sitemap.xml` contents.
#[derive(Debug, Clone)]
pub struct Sitemap {
    pub permalink: String,
    /// Stylesheet URL from the theme.
    pub xsl: Option<String>,
    pub entries: Vec<SitemapEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
    pub changefreq: ChangeFreq,
    pub priority: f64,
}

/// An RSS or Atom feed.
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    pub path: &'static str,
    pub permalink: String,
    pub xsl: Option<String>,
    /// Leading slice of the canonical post list.
    pub posts: Vec<usize>,
}

/// `robots.txt` contents.
#[derive(Debug, Clone)]
pub struct Robots {
    pub agents: Vec<Agent>,
    /// Sitemap URL, when a sitemap is generated.
    pub sitemap: Option<String>,
}

/// `README.md` contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    /// A source file published as is.
    Alternate(String),
    /// A digest of the most recent posts.
    Digest {
        title: String,
        /// Post indices, newest `created` first.
        posts: Vec<usize>,
        footer: Option<String>,
    },
}

pub(crate) fn sitemap(model: &SiteModel) -> Option<Sitemap> {
    let config = model.config.sitemap.as_ref()?;
    let mut entries = Vec::with_capacity(model.posts.len() + model.tags.len() + 2);

    if let Some(first) = model.index.first() {
        entries.push(SitemapEntry {
            loc: first.permalink.clone(),
            lastmod: model.modified,
            changefreq: config.changefreq,
            priority: config.priority,
        });
    }

    if config.enable_tag {
        entries.push(SitemapEntry {
            loc: model.tags_permalink.clone(),
            lastmod: model.modified,
            changefreq: config.changefreq,
            priority: config.priority,
        });
        for tag in model.ordered_tags() {
            entries.push(SitemapEntry {
                loc: tag.permalink.clone(),
                lastmod: tag.modified.unwrap_or(model.modified),
                changefreq: config.changefreq,
                priority: config.priority,
            });
        }
    }

    for node in &model.posts {
        entries.push(SitemapEntry {
            loc: node.permalink.clone(),
            lastmod: node.post.modified,
            changefreq: config.post_changefreq,
            priority: config.post_priority,
        });
    }

    Some(Sitemap {
        permalink: model.url(SITEMAP_FILE),
        xsl: model
            .theme
            .sitemap_xsl
            .as_deref()
            .map(|xsl| theme_url(&model.config.url, &model.theme.id, &[xsl])),
        entries,
    })
}

pub(crate) fn feed(
    model: &SiteModel,
    config: Option<&FeedConfig>,
    path: &'static str,
    xsl: Option<&str>,
) -> Option<Feed> {
    let config = config?;
    let size = usize::try_from(config.size).unwrap_or(0).min(model.posts.len());

    Some(Feed {
        title: config.title.clone(),
        path,
        permalink: model.url(path),
        xsl: xsl.map(|xsl| theme_url(&model.config.url, &model.theme.id, &[xsl])),
        posts: (0..size).collect(),
    })
}

pub(crate) fn robots(model: &SiteModel) -> Option<Robots> {
    let agents = model.config.robots.clone()?;
    Some(Robots {
        agents,
        sitemap: model.sitemap.as_ref().map(|s| s.permalink.clone()),
    })
}

pub(crate) fn profile(
    config: &ProfileConfig,
    posts: &[PostNode],
    alternate: Option<String>,
) -> Result<Profile, CoreError> {
    match config {
        ProfileConfig::Alternate { path } => alternate
            .map(Profile::Alternate)
            .ok_or_else(|| missing_config_file("profile.alternate", path)),
        ProfileConfig::Digest { title, size, footer } => {
            let mut recent: Vec<usize> = (0..posts.len()).collect();
            recent.sort_by(|&a, &b| posts[b].post.created.cmp(&posts[a].post.created));
            recent.truncate(*size);

            Ok(Profile::Digest {
                title: title.clone(),
                posts: recent,
                footer: footer.clone(),
            })
        }
    }
}
