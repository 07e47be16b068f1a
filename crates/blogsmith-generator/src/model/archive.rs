//! Archive buckets.

use blogsmith_core::{
    Config, build_url,
    config::{ArchiveConfig, ArchiveType, SortOrder},
};
use chrono::{Datelike, NaiveDate};

use super::{PostNode, page_path};

/// Output path of the archive page, without extension.
pub const ARCHIVE_PAGE: &str = "archive";

/// The archive page.
#[derive(Debug, Clone)]
pub struct Archive {
    pub title: String,
    pub path: String,
    pub permalink: String,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub buckets: Vec<ArchiveBucket>,
}

/// Posts created within one month or one year.
#[derive(Debug, Clone)]
pub struct ArchiveBucket {
    /// First day of the period.
    pub key: NaiveDate,
    pub title: String,
    /// Indices into the canonical post list, in canonical order.
    pub posts: Vec<usize>,
}

fn bucket_key(kind: ArchiveType, created: NaiveDate) -> NaiveDate {
    let (year, month) = match kind {
        ArchiveType::Year => (created.year(), 1),
        ArchiveType::Month => (created.year(), created.month()),
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(created)
}

pub(crate) fn bucket(config: &Config, archive: &ArchiveConfig, posts: &[PostNode], ext: &str) -> Archive {
    let mut buckets: Vec<ArchiveBucket> = Vec::new();

    for (i, node) in posts.iter().enumerate() {
        let key = bucket_key(archive.kind, node.post.created.date_naive());
        match buckets.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.posts.push(i),
            None => buckets.push(ArchiveBucket {
                key,
                title: key.format(&archive.format).to_string(),
                posts: vec![i],
            }),
        }
    }

    match archive.order {
        SortOrder::Asc => buckets.sort_by(|a, b| a.key.cmp(&b.key)),
        SortOrder::Desc => buckets.sort_by(|a, b| b.key.cmp(&a.key)),
    }

    let path = page_path(ARCHIVE_PAGE, ext);
    Archive {
        title: archive.title.clone(),
        permalink: build_url(&config.url, &[&path]),
        path,
        keywords: archive.keywords.clone().or_else(|| config.keywords.clone()),
        description: archive.description.clone().or_else(|| config.description.clone()),
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use blogsmith_core::PostState;
    use chrono::Utc;

    use super::{super::tests::*, *};
    use crate::model::SiteModel;

    fn model(extra: &str) -> SiteModel {
        let posts = vec![
            post("top", date(2021, 6, 1), PostState::Top, &[]),
            post("jan-a", date(2024, 1, 20), PostState::Default, &[]),
            post("mar", date(2024, 3, 2), PostState::Default, &[]),
            post("jan-b", date(2024, 1, 5), PostState::Default, &[]),
            post("old", date(2023, 12, 31), PostState::Default, &[]),
        ];
        SiteModel::build(source(config(extra), vec![], posts), "html", Utc::now()).expect("build")
    }

    fn titles(archive: &Archive) -> Vec<&str> {
        archive.buckets.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn test_month_buckets() {
        let model = model("archive:\n  title: Archive\n  type: month\n");
        let archive = model.archive.as_ref().expect("archive");

        assert_eq!(titles(archive), vec!["2024-03", "2024-01", "2023-12", "2021-06"]);

        let jan = &archive.buckets[1];
        let slugs: Vec<_> = jan.posts.iter().map(|&i| model.posts[i].post.slug.as_str()).collect();
        assert_eq!(slugs, vec!["posts/jan-a", "posts/jan-b"]);
        assert_eq!(archive.permalink, "https://example.com/archive.html");
    }

    #[test]
    fn test_year_buckets_ascending() {
        let model = model("archive:\n  title: Archive\n  order: asc\n  format: \"Year %Y\"\n");
        let archive = model.archive.as_ref().expect("archive");

        assert_eq!(titles(archive), vec!["Year 2021", "Year 2023", "Year 2024"]);
        assert_eq!(archive.buckets[2].posts.len(), 3);
    }

    #[test]
    fn test_buckets_partition_posts() {
        let model = model("archive:\n  type: month\n");
        let archive = model.archive.as_ref().expect("archive");

        let all: Vec<usize> = archive.buckets.iter().flat_map(|b| b.posts.iter().copied()).collect();
        let unique: HashSet<usize> = all.iter().copied().collect();
        assert_eq!(all.len(), model.posts.len());
        assert_eq!(unique.len(), model.posts.len());

        // Membership never reorders posts.
        for bucket in &archive.buckets {
            assert!(bucket.posts.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_no_archive_section() {
        assert!(model("").archive.is_none());
    }
}
