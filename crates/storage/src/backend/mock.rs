//! In-memory store backend for testing.

use crate::backend::StoreBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// In-memory store backend for testing.
///
/// Files are stored in a `BTreeMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Sources passed to
/// [`put`](StoreBackend::put) are still read from the real filesystem.
///
/// # Examples
///
/// ```
/// use stash_storage::backend::{MockBackend, StoreBackend};
/// use std::path::Path;
///
/// let backend = MockBackend::with_files([("ea/GEeeRaFOcbp", b"font")]);
/// assert!(backend.exists(Path::new("ea/GEeeRaFOcbp")).unwrap());
///
/// backend.reset().unwrap();
/// assert!(backend.list().unwrap().is_empty());
/// ```
pub struct MockBackend {
    name: String,
    storage: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Snapshot of every stored file.
    pub fn files(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.storage.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_files(std::iter::empty::<(PathBuf, Vec<u8>)>())
    }
}

impl StoreBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&self) -> Result<()> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner).clear();
        Ok(())
    }

    fn put(&self, path: &Path, source: &Path) -> Result<u64> {
        let path = validate_path(path)?;
        let data = std::fs::read(source).map_err(|e| ErrorKind::from_io(e, source))?;
        let size = data.len() as u64;
        self.storage.write().unwrap_or_else(PoisonError::into_inner).insert(path, data);
        Ok(size)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        self.storage.write().unwrap_or_else(PoisonError::into_inner).insert(path, data.to_vec());
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let guard = self.storage.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.storage.read().unwrap_or_else(PoisonError::into_inner).contains_key(&path))
    }

    fn list(&self) -> Result<Vec<PathBuf>> {
        Ok(self.storage.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect())
    }
}
