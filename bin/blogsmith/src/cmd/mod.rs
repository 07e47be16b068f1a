//! Command implementations.

pub mod build;
pub mod check;
pub mod drafts;
pub mod init;
pub mod new;
pub mod serve;
pub mod styles;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use blogsmith_core::DirSource;
use blogsmith_generator::{BuildOptions, BuildStats, Builder, OutputWriter};
use blogsmith_parser::MarkdownParser;

/// A builder reading `src` through the markdown engine.
pub(crate) fn builder(src: &Path, writer: Arc<dyn OutputWriter>, options: BuildOptions) -> Builder {
    let span = tracing::info_span!("build", src = %src.display());
    Builder::new(
        Arc::new(DirSource::new(src)),
        writer,
        Arc::new(MarkdownParser::new()),
        options,
    )
    .with_span(span)
}

/// `dest` as a `/`-separated path relative to `src`, when it lies inside it.
pub(crate) fn nested_dest(src: &Path, dest: &Path) -> Option<String> {
    let src = std::path::absolute(src).ok()?;
    let dest = std::path::absolute(dest).ok()?;
    let rel: PathBuf = dest.strip_prefix(&src).ok()?.to_path_buf();

    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Print build statistics in a user-friendly format.
pub(crate) fn print_stats(stats: &BuildStats) {
    println!();
    println!("  Build Statistics:");
    println!("  ─────────────────────────────────");
    println!("  Posts:        {:>6}", stats.posts);
    println!("  Tags:         {:>6}", stats.tags);
    println!("  Pages:        {:>6}", stats.pages);
    println!("  Assets:       {:>6}", stats.assets);
    println!("  ─────────────────────────────────");
    println!("  Files:        {:>6}", stats.files);
    println!("  Duration:     {:>6}ms", stats.duration_ms);
    println!();
}
