//! Build command - generates the static site

use std::{path::Path, sync::Arc};

use blogsmith_generator::{BuildOptions, DirWriter};
use color_eyre::eyre::{Result, WrapErr};

use super::{builder, nested_dest, print_stats};

/// Run the build command.
///
/// Builds the site under `src` into `dest`.
pub fn run(src: &Path, dest: &Path, drafts: bool, base_url: Option<&str>) -> Result<()> {
    tracing::info!(src = %src.display(), dest = %dest.display(), drafts, ?base_url, "Starting build");

    let options = BuildOptions {
        base_url: base_url.map(str::to_string),
        preview: drafts,
        exclude: nested_dest(src, dest).into_iter().collect(),
        ..BuildOptions::default()
    };

    let stats = builder(src, Arc::new(DirWriter::new(dest)), options)
        .rebuild()
        .wrap_err("Build failed")?;

    println!();
    println!("  Build completed successfully!");
    print_stats(&stats);
    println!("  Output:     {}", dest.display());
    println!();

    Ok(())
}
