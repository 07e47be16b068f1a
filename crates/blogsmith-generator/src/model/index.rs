//! Paginated index.

use std::ops::Range;

use blogsmith_core::{Config, build_url};

use super::{PostNode, page_path};

/// Output path of the first index page, without extension.
pub const INDEX_PAGE: &str = "index";

/// One page of the canonical post list.
#[derive(Debug, Clone)]
pub struct IndexPage {
    /// 1-based page number.
    pub number: usize,
    pub title: String,
    pub path: String,
    pub permalink: String,
    /// Slice of the canonical post list shown on this page.
    pub posts: Range<usize>,
    /// Index of the previous page in [`SiteModel::index`](super::SiteModel::index).
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

/// `index.<ext>` for the first page, `index-<n>.<ext>` after that.
fn index_path(number: usize, ext: &str) -> String {
    if number <= 1 {
        page_path(INDEX_PAGE, ext)
    } else {
        page_path(&format!("{INDEX_PAGE}-{number}"), ext)
    }
}

pub(crate) fn paginate(config: &Config, posts: &[PostNode], ext: &str) -> Vec<IndexPage> {
    let size = config.index.size.max(1);
    let count = posts.len().div_ceil(size);

    (0..count)
        .map(|i| {
            let number = i + 1;
            let path = index_path(number, ext);
            IndexPage {
                number,
                title: config.index_title(number),
                permalink: build_url(&config.url, &[&path]),
                path,
                posts: i * size..((i + 1) * size).min(posts.len()),
                prev: i.checked_sub(1),
                next: (number < count).then_some(number),
            }
        })
        .collect()
}
