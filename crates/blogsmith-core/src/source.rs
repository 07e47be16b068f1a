//! Read-only views over the site source tree.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::error::{CoreError, Result};

/// Site configuration file.
pub const CONFIG_FILE: &str = "conf.yaml";
/// Tag definitions.
pub const TAGS_FILE: &str = "tags.yaml";
/// Root of all posts.
pub const POSTS_DIR: &str = "posts";
/// Root of all themes.
pub const THEMES_DIR: &str = "themes";
/// Theme descriptor, inside `themes/<id>/`.
pub const THEME_FILE: &str = "theme.yaml";
/// Theme layouts, inside `themes/<id>/`.
pub const LAYOUT_DIR: &str = "layout";

/// A hierarchical, read-only file view.
///
/// Paths are relative POSIX paths; see [`validate_path`].
pub trait ContentSource: Send + Sync {
    /// List every file below `root` (`""` for the whole tree), sorted.
    fn list(&self, root: &str) -> Result<Vec<String>>;

    /// Read one file.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Whether `path` names an existing file.
    fn exists(&self, path: &str) -> bool;

    /// Read one file as UTF-8 text.
    fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            CoreError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

/// Check that `path` is relative, uses `/` separators and stays inside the root.
///
/// A leading `./` is dropped.
pub fn validate_path(path: &str) -> Result<&str> {
    let trimmed = path.strip_prefix("./").unwrap_or(path);

    if trimmed.starts_with('/') {
        return Err(CoreError::path(path, "absolute paths are not allowed"));
    }
    if trimmed.contains('\\') {
        return Err(CoreError::path(path, "use '/' as the separator"));
    }
    if trimmed.split('/').any(|seg| seg == "..") {
        return Err(CoreError::path(path, "'..' is not allowed"));
    }

    Ok(trimmed)
}

/// A source backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this source reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let path = validate_path(path)?;
        Ok(self.root.join(path))
    }
}

impl ContentSource for DirSource {
    fn list(&self, root: &str) -> Result<Vec<String>> {
        let dir = self.resolve(root)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map_or_else(|| dir.clone(), Path::to_path_buf);
                CoreError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(rel);
        }

        files.sort();
        Ok(files)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        std::fs::read(&full).map_err(|e| CoreError::io(full, e))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// An in-memory source, handy for tests and generated sites.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: &str, content: impl Into<Vec<u8>>) -> Result<()> {
        let path = validate_path(path)?;
        self.files.insert(path.to_string(), content.into());
        Ok(())
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with(mut self, path: &str, content: impl Into<Vec<u8>>) -> Result<Self> {
        self.insert(path, content)?;
        Ok(self)
    }
}

impl ContentSource for MemorySource {
    fn list(&self, root: &str) -> Result<Vec<String>> {
        let root = validate_path(root)?.trim_end_matches('/');
        let files = self
            .files
            .keys()
            .filter(|p| root.is_empty() || p.strip_prefix(root).is_some_and(|rest| rest.starts_with('/')))
            .cloned()
            .collect();
        Ok(files)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        self.files.get(path).cloned().ok_or_else(|| {
            CoreError::io(path, std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
        })
    }

    fn exists(&self, path: &str) -> bool {
        validate_path(path).is_ok_and(|p| self.files.contains_key(p))
    }
}
