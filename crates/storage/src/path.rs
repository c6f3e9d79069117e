//! Path validation and logical path utilities.
//!
//! Store-relative paths must never escape the store root, and logical paths
//! recorded in the manifest are always `/`-separated regardless of platform.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path for security and correctness.
/// Ensures that paths don't escape the storage root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use stash_storage::validate_path;
/// // Valid paths
/// assert!(validate_path("ea/GEeeRaFOcbp").is_ok());
/// assert!(validate_path("lookup").is_ok());
/// // Invalid paths
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a/../../b").is_err());
/// assert!(validate_path("a\0b").is_err());
/// // Paths get resolved
/// assert_eq!(validate_path("./ea//GEeeRaFOcbp").unwrap(), Path::new("ea/GEeeRaFOcbp"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls, reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Render a root-relative path as a logical path: components joined with
/// `/`, no leading or trailing separator.
///
/// # Errors
/// [`InvalidPath`](ErrorKind::InvalidPath) if the path is empty, escapes its
/// root, or contains a component that isn't valid UTF-8 (the manifest is a
/// text document).
pub fn logical(relative: impl AsRef<Path>) -> Result<String> {
    let relative = relative.as_ref();
    let validated = validate(relative)?;
    let mut parts = Vec::new();
    for component in validated.components() {
        match component.as_os_str().to_str() {
            Some(s) => parts.push(s),
            None => exn::bail!(ErrorKind::InvalidPath(relative.to_path_buf())),
        }
    }
    Ok(parts.join("/"))
}
