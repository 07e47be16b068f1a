//! RSS feed generation.
//!
//! Generates an RSS 2.0 channel from the leading posts of the canonical order.

use rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tracing::debug;

use crate::{
    model::{Feed, PostNode, SiteModel},
    xml::{Result, XmlError, into_string, with_stylesheet},
};

/// Render `rss.xml`.
pub fn render(model: &SiteModel, feed: &Feed) -> Result<String> {
    debug!(count = feed.posts.len(), "generating RSS feed");

    let config = &model.config;
    let items: Vec<Item> = feed
        .posts
        .iter()
        .map(|&i| post_to_item(model, &model.posts[i]))
        .collect();

    let channel = ChannelBuilder::default()
        .title(feed.title.clone())
        .link(config.url.clone())
        .description(config.subtitle.clone().unwrap_or_else(|| config.title.clone()))
        .language(Some(config.language.clone()))
        .pub_date(Some(config.uptime.to_rfc2822()))
        .last_build_date(Some(model.modified.to_rfc2822()))
        .generator(Some("blogsmith".to_string()))
        .items(items)
        .build();

    let bytes = channel
        .write_to(Vec::new())
        .map_err(|e| XmlError::encode(feed.path, e))?;
    Ok(with_stylesheet(into_string(feed.path, bytes)?, feed.xsl.as_deref()))
}

fn post_to_item(model: &SiteModel, node: &PostNode) -> Item {
    let post = &node.post;
    let guid = GuidBuilder::default().value(node.permalink.clone()).permalink(true).build();

    let categories = node
        .tags
        .iter()
        .map(|&t| CategoryBuilder::default().name(model.tags[t].tag.title.clone()).build())
        .collect::<Vec<_>>();

    ItemBuilder::default()
        .title(Some(post.title.clone()))
        .link(Some(node.permalink.clone()))
        .guid(Some(guid))
        .description(Some(post.summary.clone()))
        .pub_date(Some(post.created.to_rfc2822()))
        .categories(categories)
        .build()
}

#[cfg(test)]
mod tests {
    use blogsmith_core::PostState;
    use chrono::Utc;

    use super::*;
    use crate::model::tests::{config, date, post, source, tag};

    fn model() -> SiteModel {
        let mut first = post("first", date(2024, 1, 1), PostState::Default, &["rust"]);
        first.summary = "Fish & chips".to_string();
        let posts = vec![first, post("second", date(2024, 2, 1), PostState::Default, &["rust"])];
        SiteModel::build(
            source(config("rss:\n  title: My Feed\n  size: 1\n"), vec![tag("rust")], posts),
            "html",
            Utc::now(),
        )
        .expect("build")
    }

    #[test]
    fn test_render_rss() {
        let model = model();
        let feed = model.rss.as_ref().expect("rss");
        let xml = render(&model, feed).expect("render");

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<title>My Feed</title>"));
        assert!(xml.contains("<link>https://example.com/posts/second.html</link>"));
        assert!(!xml.contains("first.html"));
        assert!(xml.contains("<category>RUST</category>"));
        assert!(xml.contains("<language>cmn-Hans</language>"));
    }

    #[test]
    fn test_render_rss_with_stylesheet() {
        let model = model();
        let mut feed = model.rss.clone().expect("rss");
        feed.xsl = Some("https://example.com/themes/default/rss.xsl".to_string());

        let xml = render(&model, &feed).expect("render");
        assert!(xml.contains("<?xml-stylesheet type=\"text/xsl\" href=\"https://example.com/themes/default/rss.xsl\"?>"));
    }
}
