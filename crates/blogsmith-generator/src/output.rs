//! Output sinks.
//!
//! A writer remembers what it wrote so [`OutputWriter::reset`] can take back
//! exactly that and nothing else.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use blogsmith_core::source::validate_path;
use thiserror::Error;
use tracing::debug;

/// Output errors.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Underlying file system failure.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Path escapes the output root.
    #[error("invalid output path: {0}")]
    Path(#[from] blogsmith_core::CoreError),

    /// Nothing has been written at this path.
    #[error("not found: {0}")]
    NotFound(String),
}

impl OutputError {
    fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether a read failed because nothing is there.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            Self::Path(_) => false,
        }
    }

    /// Whether a read failed on permissions.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied)
    }
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

/// A writable file tree. Reads may interleave with writes and see stale data.
pub trait OutputWriter: Send + Sync {
    /// Write `bytes` at `path`, creating parent directories.
    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<()>;

    /// Remove every file this writer has written, and nothing else.
    fn reset(&self) -> Result<()>;

    /// Read back a file; used by the preview server.
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
}

/// Writes into a directory on disk.
#[derive(Debug)]
pub struct DirWriter {
    root: PathBuf,
    state: Mutex<Written>,
}

#[derive(Debug, Default)]
struct Written {
    files: BTreeSet<PathBuf>,
    dirs: BTreeSet<PathBuf>,
}

impl DirWriter {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Mutex::new(Written::default()),
        }
    }

    /// Output directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(path)?))
    }

    /// Create missing ancestors of `file`, remembering the ones we made.
    fn make_parents(&self, file: &Path, state: &mut Written) -> Result<()> {
        let Some(parent) = file.parent() else {
            return Ok(());
        };

        let mut missing = Vec::new();
        let mut dir = parent;
        while !dir.exists() {
            missing.push(dir.to_path_buf());
            match dir.parent() {
                Some(up) => dir = up,
                None => break,
            }
        }

        fs::create_dir_all(parent).map_err(|e| OutputError::io(parent, e))?;
        state.dirs.extend(missing);
        Ok(())
    }
}

impl OutputWriter for DirWriter {
    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let full = self.resolve(path)?;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        self.make_parents(&full, &mut state)?;
        fs::write(&full, bytes).map_err(|e| OutputError::io(&full, e))?;
        state.files.insert(full);
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        for file in std::mem::take(&mut state.files) {
            match fs::remove_file(&file) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(OutputError::io(file, e)),
            }
        }

        // Deepest first, and only directories we created that are now empty.
        let dirs = std::mem::take(&mut state.dirs);
        for dir in dirs.iter().rev() {
            if fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none()) {
                fs::remove_dir(dir).map_err(|e| OutputError::io(dir, e))?;
            }
        }

        debug!(root = %self.root.display(), "reset output directory");
        Ok(())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| OutputError::io(full, e))
    }
}

/// Keeps the whole site in memory; the default for previews.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths currently held, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl OutputWriter for MemoryWriter {
    fn write_file(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        self.files.write().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| OutputError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_writer_reset_keeps_foreign_files() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join("CNAME"), "example.com").expect("write");
        fs::create_dir_all(dir.path().join("tags")).expect("mkdir");
        fs::write(dir.path().join("tags/keep.txt"), "mine").expect("write");

        let writer = DirWriter::new(dir.path());
        writer.write_file("index.html", b"<html>").expect("write index");
        writer.write_file("tags/rust.html", b"rust").expect("write tag");
        writer.write_file("posts/2024/a.html", b"a").expect("write post");

        assert_eq!(writer.read_file("posts/2024/a.html").expect("read"), b"a");

        writer.reset().expect("reset");

        assert!(dir.path().join("CNAME").exists());
        assert!(dir.path().join("tags/keep.txt").exists());
        assert!(!dir.path().join("index.html").exists());
        assert!(!dir.path().join("tags/rust.html").exists());
        assert!(!dir.path().join("posts").exists());
    }

    #[test]
    fn test_dir_writer_rejects_escape() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let writer = DirWriter::new(dir.path().join("out"));
        assert!(matches!(writer.write_file("../x", b"x"), Err(OutputError::Path(_))));
    }

    #[test]
    fn test_dir_writer_read_missing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let writer = DirWriter::new(dir.path());
        assert!(writer.read_file("nope.html").unwrap_err().is_not_found());
    }

    #[test]
    fn test_memory_writer() {
        let writer = MemoryWriter::new();
        writer.write_file("./index.html", b"home").expect("write");
        writer.write_file("tags/a.html", b"a").expect("write");

        assert_eq!(writer.paths(), vec!["index.html", "tags/a.html"]);
        assert_eq!(writer.read_file("index.html").expect("read"), b"home");

        let shared = writer.clone();
        shared.reset().expect("reset");
        assert!(writer.paths().is_empty());
        assert!(writer.read_file("index.html").unwrap_err().is_not_found());
    }
}
