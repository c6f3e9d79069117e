//! Local filesystem store backend.
//!
//! Objects are plain files under a configured directory, accessed with
//! `std::fs`.

use crate::backend::StoreBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use exn::ResultExt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Local filesystem store backend.
///
/// All paths are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use stash_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("gdatas", "/path/to/Resources/gdatas")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory of the store
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// The root does not need to exist yet; [`reset`](StoreBackend::reset)
    /// creates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() && !root.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        Ok(Self { name: name.into(), root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative storage path.
    ///
    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn ensure_parent(&self, absolute: &Path, relative: &Path) -> Result<()> {
        if let Some(parent) = absolute.parent() {
            // `create_dir_all` succeeds when the directory already exists,
            // including when another thread created it a moment ago.
            fs::create_dir_all(parent).map_err(|e| ErrorKind::from_io(e, relative))?;
        }
        Ok(())
    }

    fn collect(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => exn::bail!(ErrorKind::from_io(e, dir)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| ErrorKind::from_io(e, dir))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| ErrorKind::from_io(e, &path))?;
            if file_type.is_dir() {
                self.collect(&path, files)?;
            } else if file_type.is_file() {
                let relative = path.strip_prefix(&self.root).or_raise(|| {
                    ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", path, self.root))
                })?;
                files.push(relative.to_path_buf());
            }
        }
        Ok(())
    }
}

impl StoreBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&self) -> Result<()> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => exn::bail!(ErrorKind::from_io(e, &self.root)),
        }
        fs::create_dir_all(&self.root).map_err(|e| ErrorKind::from_io(e, &self.root))?;
        tracing::debug!(backend = %self.name, root = %self.root.display(), "Store root reset");
        Ok(())
    }

    fn put(&self, path: &Path, source: &Path) -> Result<u64> {
        let abs_path = self.absolute_path(path)?;
        self.ensure_parent(&abs_path, path)?;
        Ok(fs::copy(source, &abs_path).map_err(|e| ErrorKind::from_io(e, source))?)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        self.ensure_parent(&abs_path, path)?;
        let parent = abs_path.parent().unwrap_or(&self.root);
        // Write next to the destination and rename over it, so readers only
        // ever see the previous file or the complete new one.
        let mut staged = NamedTempFile::new_in(parent).map_err(|e| ErrorKind::from_io(e, path))?;
        staged.write_all(data).map_err(ErrorKind::Io)?;
        staged.as_file().sync_all().map_err(ErrorKind::Io)?;
        staged.persist(&abs_path).map_err(|e| ErrorKind::from_io(e.error, path))?;
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).map_err(|e| ErrorKind::from_io(e, path))?)
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(abs_path.try_exists().map_err(ErrorKind::Io)?)
    }

    fn list(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.collect(&self.root, &mut files)?;
        files.sort();
        Ok(files)
    }
}
