//! Storage models.

use std::path::PathBuf;

/// An asset discovered under a source root.
///
/// Content is never held here; it is streamed from [`source`](Self::source)
/// when hashed and again when copied into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// Root-relative, `/`-separated path. This is the manifest key.
    pub logical_path: String,
    /// Absolute (or root-joined) location on disk
    pub source: PathBuf,
    /// File size in bytes at enumeration time
    pub size: u64,
}
impl AssetFile {
    pub fn new(logical_path: impl Into<String>, source: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            logical_path: logical_path.into(),
            source: source.into(),
            size,
        }
    }
}
