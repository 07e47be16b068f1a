//! Site configuration management.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    date::parse_datetime,
    error::{FieldError, Result},
    source::CONFIG_FILE,
};

/// Fallback for `language`.
pub const DEFAULT_LANGUAGE: &str = "cmn-Hans";

/// Main configuration structure, validated.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub title: String,
    pub subtitle: Option<String>,
    /// Appended to post titles in the browser title bar.
    pub title_separator: Option<String>,
    /// Site root, e.g. `https://example.com/blog`.
    pub url: String,
    pub language: String,
    pub uptime: DateTime<Utc>,
    pub icon: Option<Icon>,
    pub author: Author,
    pub license: Link,
    /// Theme directory name under `themes/`.
    pub theme: String,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub menus: Vec<Link>,
    /// Show a table of contents once a post has more headings than this. Zero disables it.
    pub toc: usize,
    pub index: IndexConfig,
    pub tags: TagsConfig,
    pub archive: Option<ArchiveConfig>,
    pub rss: Option<FeedConfig>,
    pub atom: Option<FeedConfig>,
    pub sitemap: Option<SitemapConfig>,
    pub robots: Option<Vec<Agent>>,
    pub profile: Option<ProfileConfig>,
}

/// A person credited for content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// A hyperlink, used for licenses and menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
}

/// Site icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub sizes: Option<String>,
}

/// Paginated index settings.
#[derive(Debug, Clone, Serialize)]
pub struct IndexConfig {
    /// May contain `%d`, replaced with the page number.
    pub title: String,
    pub size: usize,
}

/// Tag listing settings.
#[derive(Debug, Clone, Serialize)]
pub struct TagsConfig {
    pub title: String,
    pub order: TagOrder,
    pub order_by: SortOrder,
}

/// How the tag list is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagOrder {
    /// Keep the order of `tags.yaml`.
    Default,
    /// Order by number of posts.
    Size,
}

/// Ascending or descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Archive grouping granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    Year,
    Month,
}

/// Archive page settings.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveConfig {
    pub title: String,
    pub kind: ArchiveType,
    pub order: SortOrder,
    /// strftime format for bucket titles.
    pub format: String,
    pub keywords: Option<String>,
    pub description: Option<String>,
}

/// RSS or Atom feed settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub size: i64,
}

/// Sitemap `changefreq` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    /// Parse the lowercase sitemap name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "always" => Some(Self::Always),
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            "never" => Some(Self::Never),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sitemap settings.
#[derive(Debug, Clone, Serialize)]
pub struct SitemapConfig {
    pub title: Option<String>,
    pub enable_tag: bool,
    pub priority: f64,
    pub changefreq: ChangeFreq,
    pub post_priority: f64,
    pub post_changefreq: ChangeFreq,
}

/// One `robots.txt` rule block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default)]
    pub agent: Vec<String>,
    #[serde(default)]
    pub disallow: Vec<String>,
    #[serde(default)]
    pub allow: Vec<String>,
}

/// `README.md` profile settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProfileConfig {
    /// Publish this source file verbatim.
    Alternate { path: String },
    /// Generate a digest of recent posts.
    Digest {
        title: String,
        size: usize,
        footer: Option<String>,
    },
}

// Raw shapes as written in conf.yaml, before sanitizing.

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    title: String,
    subtitle: Option<String>,
    title_separator: Option<String>,
    #[serde(default)]
    url: String,
    language: Option<String>,
    uptime: Option<String>,
    icon: Option<Icon>,
    author: Option<Author>,
    license: Option<Link>,
    #[serde(default)]
    theme: String,
    keywords: Option<String>,
    description: Option<String>,
    #[serde(default)]
    menus: Vec<Link>,
    #[serde(default)]
    toc: i64,
    index: Option<RawIndex>,
    tags: Option<RawTags>,
    archive: Option<RawArchive>,
    rss: Option<FeedConfig>,
    atom: Option<FeedConfig>,
    sitemap: Option<RawSitemap>,
    robots: Option<Vec<Agent>>,
    profile: Option<RawProfile>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIndex {
    #[serde(default)]
    title: String,
    size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTags {
    #[serde(default)]
    title: String,
    order: Option<String>,
    order_by: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawArchive {
    #[serde(default)]
    title: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    order: Option<String>,
    format: Option<String>,
    keywords: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSitemap {
    title: Option<String>,
    #[serde(default)]
    enable_tag: bool,
    priority: Option<f64>,
    changefreq: Option<String>,
    post_priority: Option<f64>,
    post_changefreq: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProfile {
    alternate: Option<String>,
    #[serde(default)]
    title: String,
    size: Option<i64>,
    footer: Option<String>,
}

fn default_index_size() -> i64 {
    10
}

fn default_profile_size() -> i64 {
    10
}

fn default_priority() -> f64 {
    0.5
}

impl Config {
    /// Parse and validate `conf.yaml` text.
    ///
    /// Values may be overridden from `BLOGSMITH_*` environment variables, with `__`
    /// separating nested keys (`BLOGSMITH_RSS__SIZE=20`).
    pub fn from_yaml(text: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix("BLOGSMITH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let raw: RawConfig = settings.try_deserialize()?;
        Ok(raw.sanitize()?)
    }

    /// Parse and validate without consulting the environment.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        Ok(raw.sanitize()?)
    }
}

fn err(field: &str, message: &str) -> FieldError {
    FieldError::new(CONFIG_FILE, field, message)
}

/// Absolute http(s) URL with a host.
pub fn is_url(s: &str) -> bool {
    url::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

fn parse_order(field: &str, value: Option<&str>, default: SortOrder) -> std::result::Result<SortOrder, FieldError> {
    match value {
        None | Some("") => Ok(default),
        Some("asc") => Ok(SortOrder::Asc),
        Some("desc") => Ok(SortOrder::Desc),
        Some(other) => Err(err(field, "must be one of asc, desc").with_value(other)),
    }
}

fn parse_changefreq(field: &str, value: Option<&str>) -> std::result::Result<ChangeFreq, FieldError> {
    match value {
        None | Some("") => Ok(ChangeFreq::Daily),
        Some(s) => ChangeFreq::parse(s).ok_or_else(|| {
            err(field, "must be one of always, hourly, daily, weekly, monthly, yearly, never").with_value(s)
        }),
    }
}

fn check_priority(field: &str, value: f64) -> std::result::Result<f64, FieldError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(err(field, "must be in [0, 1]").with_value(value))
    }
}

fn positive(field: &str, value: i64) -> std::result::Result<usize, FieldError> {
    match usize::try_from(value) {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(err(field, "must be greater than 0").with_value(value)),
    }
}

impl Author {
    /// Validate an author record. The returned error has `file` and the field
    /// prefix left for the caller to fill in.
    pub fn sanitize(&self) -> std::result::Result<(), FieldError> {
        if self.name.trim().is_empty() {
            return Err(FieldError::required("", "name"));
        }
        if let Some(url) = self.url.as_deref().filter(|u| !is_url(u)) {
            return Err(FieldError::new("", "url", "is not a valid URL").with_value(url));
        }
        if let Some(avatar) = self.avatar.as_deref().filter(|u| !is_url(u)) {
            return Err(FieldError::new("", "avatar", "is not a valid URL").with_value(avatar));
        }
        if let Some(email) = self.email.as_deref().filter(|e| !is_email(e)) {
            return Err(FieldError::new("", "email", "is not a valid email").with_value(email));
        }
        Ok(())
    }
}

impl Link {
    pub(crate) fn sanitize(&self) -> std::result::Result<(), FieldError> {
        if self.text.trim().is_empty() {
            return Err(FieldError::required("", "text"));
        }
        if self.url.trim().is_empty() {
            return Err(FieldError::required("", "url"));
        }
        Ok(())
    }
}

fn located(e: FieldError, parent: &str) -> FieldError {
    let mut e = e.nested(parent);
    e.file = CONFIG_FILE.to_string();
    e
}

impl RawConfig {
    fn sanitize(self) -> std::result::Result<Config, FieldError> {
        if self.title.trim().is_empty() {
            return Err(err("title", "is required"));
        }

        if !is_url(&self.url) {
            return Err(err("url", "is not a valid URL").with_value(&self.url));
        }

        let language = self
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let uptime = match self.uptime.as_deref() {
            None | Some("") => return Err(err("uptime", "is required")),
            Some(s) => parse_datetime(s).ok_or_else(|| err("uptime", "is not a valid date").with_value(s))?,
        };
        if uptime.timestamp() == 0 {
            return Err(err("uptime", "is required"));
        }

        if let Some(icon) = &self.icon {
            if icon.url.trim().is_empty() {
                return Err(err("icon.url", "is required"));
            }
        }

        let author = self.author.ok_or_else(|| err("author", "is required"))?;
        author.sanitize().map_err(|e| located(e, "author"))?;

        let license = self.license.ok_or_else(|| err("license", "is required"))?;
        license.sanitize().map_err(|e| located(e, "license"))?;

        if self.theme.trim().is_empty() {
            return Err(err("theme", "is required"));
        }

        for (i, menu) in self.menus.iter().enumerate() {
            menu.sanitize().map_err(|e| located(e, &format!("menus[{i}]")))?;
        }

        let toc = usize::try_from(self.toc).map_err(|_| err("toc", "must not be negative").with_value(self.toc))?;

        let raw_index = self.index.unwrap_or_default();
        let index = IndexConfig {
            title: raw_index.title,
            size: positive("index.size", raw_index.size.unwrap_or_else(default_index_size))?,
        };

        let raw_tags = self.tags.unwrap_or_default();
        let tags = TagsConfig {
            title: raw_tags.title,
            order: match raw_tags.order.as_deref() {
                None | Some("") | Some("default") => TagOrder::Default,
                Some("size") => TagOrder::Size,
                Some(other) => return Err(err("tags.order", "must be one of default, size").with_value(other)),
            },
            order_by: parse_order("tags.order_by", raw_tags.order_by.as_deref(), SortOrder::Desc)?,
        };

        let archive = self.archive.map(sanitize_archive).transpose()?;

        for (name, feed) in [("rss", &self.rss), ("atom", &self.atom)] {
            if let Some(feed) = feed {
                if feed.title.trim().is_empty() {
                    return Err(err(&format!("{name}.title"), "is required"));
                }
                positive(&format!("{name}.size"), feed.size)?;
            }
        }

        let sitemap = self.sitemap.map(sanitize_sitemap).transpose()?;

        if let Some(agents) = &self.robots {
            for (i, agent) in agents.iter().enumerate() {
                let prefix = format!("robots[{i}]");
                if agent.agent.is_empty() {
                    return Err(err(&format!("{prefix}.agent"), "is required"));
                }
                if agent.disallow.is_empty() && agent.allow.is_empty() {
                    return Err(err(&format!("{prefix}.disallow"), "disallow or allow is required"));
                }
            }
        }

        let profile = self.profile.map(sanitize_profile).transpose()?;

        Ok(Config {
            title: self.title,
            subtitle: self.subtitle,
            title_separator: self.title_separator,
            url: self.url,
            language,
            uptime,
            icon: self.icon,
            author,
            license,
            theme: self.theme,
            keywords: self.keywords,
            description: self.description,
            menus: self.menus,
            toc,
            index,
            tags,
            archive,
            rss: self.rss,
            atom: self.atom,
            sitemap,
            robots: self.robots,
            profile,
        })
    }
}

fn sanitize_archive(raw: RawArchive) -> std::result::Result<ArchiveConfig, FieldError> {
    let kind = match raw.kind.as_deref() {
        None | Some("") | Some("year") => ArchiveType::Year,
        Some("month") => ArchiveType::Month,
        Some(other) => return Err(err("archive.type", "must be one of year, month").with_value(other)),
    };
    let order = parse_order("archive.order", raw.order.as_deref(), SortOrder::Desc)?;
    let format = raw.format.filter(|f| !f.trim().is_empty()).unwrap_or_else(|| {
        match kind {
            ArchiveType::Year => "%Y",
            ArchiveType::Month => "%Y-%m",
        }
        .to_string()
    });

    Ok(ArchiveConfig {
        title: raw.title,
        kind,
        order,
        format,
        keywords: raw.keywords,
        description: raw.description,
    })
}

fn sanitize_sitemap(raw: RawSitemap) -> std::result::Result<SitemapConfig, FieldError> {
    Ok(SitemapConfig {
        title: raw.title,
        enable_tag: raw.enable_tag,
        priority: check_priority("sitemap.priority", raw.priority.unwrap_or_else(default_priority))?,
        changefreq: parse_changefreq("sitemap.changefreq", raw.changefreq.as_deref())?,
        post_priority: check_priority("sitemap.post_priority", raw.post_priority.unwrap_or_else(default_priority))?,
        post_changefreq: parse_changefreq("sitemap.post_changefreq", raw.post_changefreq.as_deref())?,
    })
}

fn sanitize_profile(raw: RawProfile) -> std::result::Result<ProfileConfig, FieldError> {
    if let Some(path) = raw.alternate.filter(|p| !p.trim().is_empty()) {
        if crate::source::validate_path(&path).is_err() {
            return Err(err("profile.alternate", "must be a relative path inside the site").with_value(path));
        }
        return Ok(ProfileConfig::Alternate { path });
    }

    Ok(ProfileConfig::Digest {
        title: raw.title,
        size: positive("profile.size", raw.size.unwrap_or_else(default_profile_size))?,
        footer: raw.footer,
    })
}

impl Config {
    /// Index page title for page `n` (1-based).
    #[must_use]
    pub fn index_title(&self, page: usize) -> String {
        if self.index.title.is_empty() {
            return self.title.clone();
        }
        if page <= 1 {
            // Page one drops the page marker.
            return self.index.title.replace("%d", "").trim().to_string();
        }
        self.index.title.replace("%d", &page.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    const MINIMAL: &str = r#"
title: Test Blog
url: https://example.com
theme: default
uptime: 2020-01-01T00:00:00Z
author:
  name: alice
license:
  url: https://creativecommons.org/licenses/by/4.0/
  text: CC BY 4.0
"#;

    fn field_of(err: CoreError) -> FieldError {
        err.field_error().cloned().expect("field error")
    }

    #[test]
    fn test_load_minimal_config() {
        let config = Config::from_yaml_str(MINIMAL).expect("load config");

        assert_eq!(config.title, "Test Blog");
        assert_eq!(config.url, "https://example.com");
        assert_eq!(config.language, DEFAULT_LANGUAGE);
        assert_eq!(config.index.size, 10);
        assert_eq!(config.tags.order, TagOrder::Default);
        assert!(config.archive.is_none());
        assert!(config.rss.is_none());
        assert!(config.sitemap.is_none());
    }

    #[test]
    fn test_load_full_config() {
        let text = format!(
            "{MINIMAL}{}",
            r#"
language: en
index:
  title: "Page %d"
  size: 5
tags:
  title: Tags
  order: size
  order_by: asc
archive:
  title: Archive
  type: month
rss:
  title: RSS
  size: 10
atom:
  title: Atom
  size: 20
sitemap:
  enable_tag: true
  priority: 0.7
  changefreq: weekly
  post_priority: 0.9
  post_changefreq: monthly
robots:
  - agent: ["*"]
    disallow: ["/drafts"]
profile:
  title: Recent
  size: 3
  footer: bye
"#
        );

        let config = Config::from_yaml_str(&text).expect("load config");
        assert_eq!(config.language, "en");
        assert_eq!(config.index.size, 5);
        assert_eq!(config.tags.order, TagOrder::Size);
        assert_eq!(config.tags.order_by, SortOrder::Asc);

        let archive = config.archive.as_ref().expect("archive");
        assert_eq!(archive.kind, ArchiveType::Month);
        assert_eq!(archive.order, SortOrder::Desc);
        assert_eq!(archive.format, "%Y-%m");

        let sitemap = config.sitemap.as_ref().expect("sitemap");
        assert_eq!(sitemap.changefreq, ChangeFreq::Weekly);
        assert_eq!(sitemap.post_changefreq, ChangeFreq::Monthly);
        assert!(sitemap.enable_tag);

        assert_eq!(config.robots.as_ref().map(Vec::len), Some(1));
        assert_eq!(
            config.profile,
            Some(ProfileConfig::Digest {
                title: "Recent".into(),
                size: 3,
                footer: Some("bye".into())
            })
        );
    }

    #[test]
    fn test_load_through_config_crate() {
        let config = Config::from_yaml(MINIMAL).expect("load config");
        assert_eq!(config.theme, "default");
    }

    #[test]
    fn test_invalid_url() {
        let text = MINIMAL.replace("https://example.com", "not a url");
        let field = field_of(Config::from_yaml_str(&text).unwrap_err());
        assert_eq!(field.file, CONFIG_FILE);
        assert_eq!(field.field, "url");
    }

    #[test]
    fn test_missing_uptime() {
        let text = MINIMAL.replace("uptime: 2020-01-01T00:00:00Z\n", "");
        let field = field_of(Config::from_yaml_str(&text).unwrap_err());
        assert_eq!(field.field, "uptime");
    }

    #[test]
    fn test_author_name_required() {
        let text = MINIMAL.replace("name: alice", "url: https://alice.example.com");
        let field = field_of(Config::from_yaml_str(&text).unwrap_err());
        assert_eq!(field.field, "author.name");
        assert_eq!(field.file, CONFIG_FILE);
    }

    #[test]
    fn test_sitemap_priority_out_of_range() {
        let text = format!("{MINIMAL}sitemap:\n  priority: 1.5\n");
        let field = field_of(Config::from_yaml_str(&text).unwrap_err());
        assert_eq!(field.field, "sitemap.priority");
        assert_eq!(field.value.as_deref(), Some("1.5"));
    }

    #[test]
    fn test_unknown_changefreq_is_validation_error() {
        let text = format!("{MINIMAL}sitemap:\n  changefreq: sometimes\n");
        let err = Config::from_yaml_str(&text).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_unknown_archive_type_is_validation_error() {
        let text = format!("{MINIMAL}archive:\n  title: A\n  type: week\n");
        let err = Config::from_yaml_str(&text).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(field_of(err).field, "archive.type");
    }

    #[test]
    fn test_rss_size_must_be_positive() {
        let text = format!("{MINIMAL}rss:\n  title: RSS\n  size: 0\n");
        let field = field_of(Config::from_yaml_str(&text).unwrap_err());
        assert_eq!(field.field, "rss.size");
    }

    #[test]
    fn test_robots_requires_rules() {
        let text = format!("{MINIMAL}robots:\n  - agent: [\"*\"]\n");
        let field = field_of(Config::from_yaml_str(&text).unwrap_err());
        assert_eq!(field.field, "robots[0].disallow");
    }

    #[test]
    fn test_profile_alternate() {
        let text = format!("{MINIMAL}profile:\n  alternate: profile.md\n");
        let config = Config::from_yaml_str(&text).expect("load config");
        assert_eq!(
            config.profile,
            Some(ProfileConfig::Alternate {
                path: "profile.md".into()
            })
        );
    }

    #[test]
    fn test_index_title() {
        let text = format!("{MINIMAL}index:\n  title: \"Posts %d\"\n");
        let config = Config::from_yaml_str(&text).expect("load config");
        assert_eq!(config.index_title(1), "Posts");
        assert_eq!(config.index_title(3), "Posts 3");
    }
}
