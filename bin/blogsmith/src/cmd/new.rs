//! New command - scaffold a post

use std::{fs, path::Path};

use blogsmith_core::source::POSTS_DIR;
use blogsmith_parser::markdown::slugify;
use chrono::Utc;
use color_eyre::eyre::{Result, WrapErr, bail};

/// Run the new command.
///
/// Creates `posts/<slug>.md` under `src` as a draft.
pub fn run(src: &Path, title: &str, tags: &[String]) -> Result<()> {
    let slug = slugify(title);
    if slug.is_empty() {
        bail!("Cannot derive a file name from title {title:?}");
    }

    let file_path = src.join(POSTS_DIR).join(format!("{slug}.md"));
    tracing::info!(title, path = %file_path.display(), "Creating new post");

    if file_path.exists() {
        bail!("{} already exists", file_path.display());
    }
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).wrap_err("Failed to create directories")?;
    }

    fs::write(&file_path, front_matter(title, tags)).wrap_err("Failed to write file")?;

    println!("Created: {}", file_path.display());
    Ok(())
}

fn front_matter(title: &str, tags: &[String]) -> String {
    let created = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let title = title.replace('"', "\\\"");
    let tags = tags.join(", ");

    format!(
        r#"---
title: "{title}"
created: {created}
state: draft
tags: [{tags}]
---

Write your content here.
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post() {
        let dir = tempfile::tempdir().expect("tempdir");
        run(dir.path(), "Hello, \"World\"", &["rust".to_string(), "life".to_string()]).expect("new");

        let text = fs::read_to_string(dir.path().join("posts/hello-world.md")).expect("post");
        assert!(text.starts_with("---\ntitle: \"Hello, \\\"World\\\"\"\n"));
        assert!(text.contains("state: draft\n"));
        assert!(text.contains("tags: [rust, life]\n"));
    }

    #[test]
    fn test_new_post_refuses_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        run(dir.path(), "Twice", &[]).expect("first");
        assert!(run(dir.path(), "Twice", &[]).is_err());
    }

    #[test]
    fn test_new_post_needs_slug() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(run(dir.path(), "!!!", &[]).is_err());
    }
}
