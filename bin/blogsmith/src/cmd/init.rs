//! Init command - scaffold a new site

use std::{fs, path::Path};

use blogsmith_core::source::{CONFIG_FILE, POSTS_DIR, TAGS_FILE, THEME_FILE, THEMES_DIR};
use chrono::{DateTime, Utc};
use color_eyre::eyre::{Result, WrapErr, bail};

const TAGS: &str = "\
- slug: default
  title: Default
  content: Posts without a better home.
";

const THEME: &str = "\
url: https://example.com
description: The default theme
";

/// Run the init command.
///
/// Writes `conf.yaml`, `tags.yaml`, a default theme descriptor and one draft
/// post under `dir`. Refuses to touch a directory that already has a config.
pub fn run(dir: &Path) -> Result<()> {
    if dir.join(CONFIG_FILE).exists() {
        bail!("{} already has a {CONFIG_FILE}", dir.display());
    }
    tracing::info!(dir = %dir.display(), "Initializing site");

    let now = Utc::now();
    let post = format!("{POSTS_DIR}/{}/post1.md", now.format("%Y"));
    let files = [
        (CONFIG_FILE.to_string(), config(now)),
        (TAGS_FILE.to_string(), TAGS.to_string()),
        (format!("{THEMES_DIR}/default/{THEME_FILE}"), THEME.to_string()),
        (post, sample_post(now)),
    ];

    for (path, content) in &files {
        let full = dir.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&full, content).wrap_err_with(|| format!("Failed to write {}", full.display()))?;
        println!("Created: {path}");
    }

    Ok(())
}

fn config(now: DateTime<Utc>) -> String {
    format!(
        "\
title: example
url: https://example.com
theme: default
uptime: {}
author:
  name: example
license:
  url: https://creativecommons.org/licenses/by/4.0/
  text: CC BY 4.0
",
        now.format("%Y-%m-%dT%H:%M:%SZ")
    )
}

fn sample_post(now: DateTime<Utc>) -> String {
    let created = now.format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        "\
---
title: title
created: {created}
modified: {created}
tags:
  - default
state: draft
---

Write your content here.
"
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use blogsmith_generator::{BuildOptions, MemoryWriter};

    use super::*;
    use crate::cmd::builder;

    #[test]
    fn test_init_builds_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        run(dir.path()).expect("init");

        assert!(dir.path().join("conf.yaml").is_file());
        assert!(dir.path().join("tags.yaml").is_file());
        assert!(dir.path().join("themes/default/theme.yaml").is_file());

        let options = BuildOptions {
            preview: true,
            ..BuildOptions::default()
        };
        let model = builder(dir.path(), Arc::new(MemoryWriter::new()), options)
            .check()
            .expect("scaffold is a valid site");
        assert_eq!(model.posts.len(), 1);
        assert!(model.posts[0].post.is_draft());
        assert!(model.posts[0].post.slug.starts_with("posts/"));
        assert!(model.posts[0].post.slug.ends_with("/post1"));
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("conf.yaml"), "title: mine\n").expect("write");

        assert!(run(dir.path()).is_err());
        assert_eq!(fs::read_to_string(dir.path().join("conf.yaml")).expect("read"), "title: mine\n");
        assert!(!dir.path().join("tags.yaml").exists());
    }
}
