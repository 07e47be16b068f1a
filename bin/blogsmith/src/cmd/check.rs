//! Check command - validate configuration and content

use std::{path::Path, sync::Arc};

use blogsmith_generator::{BuildError, BuildOptions, MemoryWriter, SiteModel};
use color_eyre::eyre::{Result, bail};

use super::builder;

/// Run the check command.
///
/// Loads and cross-references the whole site and renders it in memory
/// without writing anything. The first invalid record fails the check.
pub fn run(src: &Path, drafts: bool, strict: bool) -> Result<()> {
    tracing::info!(src = %src.display(), drafts, strict, "Checking site");

    let options = BuildOptions {
        preview: drafts,
        ..BuildOptions::default()
    };

    println!("Checking {}...", src.display());
    let model = match builder(src, Arc::new(MemoryWriter::new()), options).check() {
        Ok(model) => model,
        Err(e) => {
            println!("  ✗ {}", describe(&e));
            bail!("Check failed: {e}");
        }
    };

    println!("  ✓ {} posts, {} tags, {} index pages", model.posts.len(), model.tags.len(), model.index.len());

    let warnings = warnings(&model);
    if !warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warn in &warnings {
            println!("  ⚠ {warn}");
        }
    }

    if strict && !warnings.is_empty() {
        bail!("Check failed with {} warning(s) (strict mode)", warnings.len());
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Point at the offending file and field when there is one.
fn describe(err: &BuildError) -> String {
    match err {
        BuildError::Core(core) => match core.field_error() {
            Some(field) => format!("{}: {} ({})", field.file, field.message, field.field),
            None => core.to_string(),
        },
        other => other.to_string(),
    }
}

/// Non-fatal findings.
fn warnings(model: &SiteModel) -> Vec<String> {
    let mut warnings = Vec::new();

    if model.posts.is_empty() {
        warnings.push("no posts found".to_string());
    }
    for tag in model.ordered_tags().filter(|t| t.posts.is_empty()) {
        warnings.push(format!("tag '{}' is not used by any post", tag.tag.slug));
    }

    warnings
}
