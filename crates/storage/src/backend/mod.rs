//! Store backend trait and implementations.
//!
//! A store backend owns a single store root. Everything it is asked to touch
//! is addressed relative to that root and validated with
//! [`validate_path`](crate::validate_path) first.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Unified interface for the destination of a release.
///
/// Operations are synchronous; the release pipeline is blocking disk I/O from
/// end to end. Implementations must be usable from several threads at once
/// (`&self` everywhere) and directory creation must be idempotent, since
/// multiple files can land in the same shard concurrently.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use stash_storage::backend::StoreBackend;
/// use stash_storage::error::Result;
///
/// fn manifest_size(backend: &dyn StoreBackend) -> Result<u64> {
///     let path = Path::new("lookup");
///     match backend.exists(path)? {
///         true => Ok(backend.read(path)?.len() as u64),
///         false => Ok(0),
///     }
/// }
/// ```
pub trait StoreBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Remove everything under the store root, leaving it empty.
    ///
    /// A release is a full rebuild: the store is reset before anything is
    /// copied into it.
    fn reset(&self) -> Result<()>;

    /// Copy the file at `source` (outside the store) to `path` inside the
    /// store, creating parent directories as needed and replacing any file
    /// already there. Returns the number of bytes copied.
    fn put(&self, path: &Path, source: &Path) -> Result<u64>;

    /// Write `data` to `path`, replacing any existing file as a whole.
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Read an entire file.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    fn exists(&self, path: &Path) -> Result<bool>;

    /// List every file in the store, sorted.
    fn list(&self) -> Result<Vec<PathBuf>>;
}
