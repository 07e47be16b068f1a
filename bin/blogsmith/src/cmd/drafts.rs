//! Drafts command - list unpublished posts

use std::{path::Path, sync::Arc};

use blogsmith_core::DirSource;
use blogsmith_generator::SiteLoader;
use blogsmith_parser::MarkdownParser;
use color_eyre::eyre::Result;

/// Run the drafts command.
pub fn run(src: &Path) -> Result<()> {
    let drafts = list(src)?;
    if drafts.is_empty() {
        println!("No drafts.");
        return Ok(());
    }

    for (title, slug) in &drafts {
        println!("{title}\t{slug}");
    }
    Ok(())
}

/// Title and slug of every draft under `src`, in load order.
fn list(src: &Path) -> Result<Vec<(String, String)>> {
    tracing::debug!(src = %src.display(), "Listing drafts");

    let site = SiteLoader::new(Arc::new(MarkdownParser::new()))
        .with_preview(true)
        .load(&DirSource::new(src))?;

    Ok(site
        .posts
        .into_iter()
        .filter(|p| p.is_draft())
        .map(|p| (p.title, p.slug))
        .collect())
}
