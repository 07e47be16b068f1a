//! Atom 1.0 feed generation.

use atom_syndication::{
    CategoryBuilder, Entry, EntryBuilder, FeedBuilder, FixedDateTime, GeneratorBuilder, Link, LinkBuilder, Person,
    PersonBuilder, Text,
};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    model::{Feed, PostNode, SiteModel},
    xml::{Result, XmlError, into_string, with_stylesheet},
};

fn fixed(date: DateTime<Utc>) -> FixedDateTime {
    date.fixed_offset()
}

fn link(href: &str, rel: &str, mime_type: Option<&str>) -> Link {
    LinkBuilder::default()
        .href(href.to_string())
        .rel(rel.to_string())
        .mime_type(mime_type.map(str::to_string))
        .build()
}

/// Render `atom.xml`.
pub fn render(model: &SiteModel, feed: &Feed) -> Result<String> {
    debug!(count = feed.posts.len(), "generating Atom feed");

    let config = &model.config;
    let author: Person = PersonBuilder::default()
        .name(config.author.name.clone())
        .email(config.author.email.clone())
        .uri(config.author.url.clone())
        .build();

    let entries: Vec<Entry> = feed
        .posts
        .iter()
        .map(|&i| post_to_entry(model, &model.posts[i]))
        .collect();

    let atom = FeedBuilder::default()
        .title(Text::plain(feed.title.clone()))
        .subtitle(config.subtitle.clone().map(Text::plain))
        .id(config.url.clone())
        .updated(fixed(model.modified))
        .authors(vec![author])
        .links(vec![
            link(&config.url, "alternate", Some("text/html")),
            link(&feed.permalink, "self", Some("application/atom+xml")),
        ])
        .generator(Some(GeneratorBuilder::default().value("blogsmith").build()))
        .lang(Some(config.language.clone()))
        .entries(entries)
        .build();

    let bytes = atom.write_to(Vec::new()).map_err(|e| XmlError::encode(feed.path, e))?;
    Ok(with_stylesheet(into_string(feed.path, bytes)?, feed.xsl.as_deref()))
}

fn post_to_entry(model: &SiteModel, node: &PostNode) -> Entry {
    let post = &node.post;

    let categories = node
        .tags
        .iter()
        .map(|&t| {
            let tag = &model.tags[t].tag;
            CategoryBuilder::default()
                .term(tag.slug.clone())
                .label(Some(tag.title.clone()))
                .build()
        })
        .collect::<Vec<_>>();

    EntryBuilder::default()
        .title(Text::plain(post.title.clone()))
        .id(node.permalink.clone())
        .updated(fixed(post.modified))
        .published(Some(fixed(post.created)))
        .links(vec![link(&node.permalink, "alternate", Some("text/html"))])
        .summary(Some(Text::html(post.summary.clone())))
        .categories(categories)
        .build()
}

#[cfg(test)]
mod tests {
    use blogsmith_core::PostState;

    use super::*;
    use crate::model::tests::{config, date, post, source, tag};

    #[test]
    fn test_render_atom() {
        let mut edited = post("edited", date(2024, 3, 1), PostState::Default, &["rust"]);
        edited.modified = date(2024, 5, 1);
        let posts = vec![edited, post("older", date(2023, 1, 1), PostState::Default, &["rust"])];
        let model = SiteModel::build(
            source(config("atom:\n  title: Atom Feed\n  size: 10\n"), vec![tag("rust")], posts),
            "html",
            Utc::now(),
        )
        .expect("build");

        let feed = model.atom.as_ref().expect("atom");
        let xml = render(&model, feed).expect("render");

        assert!(xml.contains("<title>Atom Feed</title>"));
        assert!(xml.contains("<id>https://example.com/posts/edited.html</id>"));
        assert!(xml.contains("<id>https://example.com/posts/older.html</id>"));
        assert!(xml.contains("2024-05-01T12:00:00+00:00"));
        assert!(xml.contains("href=\"https://example.com/atom.xml\""));
        assert!(xml.contains("term=\"rust\""));
    }
}
