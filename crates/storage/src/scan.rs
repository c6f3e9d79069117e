//! Source tree enumeration.

use crate::error::{ErrorKind, Result};
use crate::models::AssetFile;
use crate::path::logical;
use std::fs::{self, DirEntry};
use std::path::{Path, PathBuf};

/// File names skipped when no exclusion list is configured.
pub const DEFAULT_EXCLUDES: &[&str] = &[".DS_Store"];

enum WalkEntry {
    File(AssetFile),
    Descend(PathBuf),
    Skip,
}

/// List every file under `root`, recursively, sorted by logical path.
///
/// Entries (files or directories) whose name appears in `excludes` are
/// skipped, as are symlinks and anything else that isn't a regular file or
/// directory. Sorting makes repeated enumerations of an unchanged tree
/// identical regardless of the order the filesystem returns entries in.
///
/// # Errors
/// - [`NotFound`](ErrorKind::NotFound) if `root` doesn't exist; an absent
///   source root is a configuration mistake, not an empty tree.
/// - [`InvalidPath`](ErrorKind::InvalidPath) if `root` isn't a directory or a
///   file name isn't valid UTF-8.
pub fn enumerate<S: AsRef<str>>(root: impl AsRef<Path>, excludes: &[S]) -> Result<Vec<AssetFile>> {
    let root = root.as_ref();
    let metadata = fs::metadata(root).map_err(|e| ErrorKind::from_io(e, root))?;
    if !metadata.is_dir() {
        exn::bail!(ErrorKind::InvalidPath(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = fs::read_dir(&current).map_err(|e| ErrorKind::from_io(e, &current))?;
        for entry in entries {
            let entry = entry.map_err(|e| ErrorKind::from_io(e, &current))?;
            match process_entry(root, entry, excludes)? {
                WalkEntry::File(f) => files.push(f),
                WalkEntry::Descend(d) => stack.push(d),
                WalkEntry::Skip => {},
            }
        }
    }
    files.sort_by(|a, b| a.logical_path.cmp(&b.logical_path));
    tracing::debug!(root = %root.display(), files = files.len(), "Enumerated source root");
    Ok(files)
}

fn process_entry<S: AsRef<str>>(root: &Path, entry: DirEntry, excludes: &[S]) -> Result<WalkEntry> {
    let path = entry.path();
    let name = entry.file_name();
    if excludes.iter().any(|exclude| name.to_str() == Some(exclude.as_ref())) {
        tracing::trace!(path = %path.display(), "Skipping excluded entry");
        return Ok(WalkEntry::Skip);
    }
    let file_type = entry.file_type().map_err(|e| ErrorKind::from_io(e, &path))?;
    if file_type.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if file_type.is_file() {
        let size = entry.metadata().map_err(|e| ErrorKind::from_io(e, &path))?.len();
        let relative = path.strip_prefix(root).map_err(|_| ErrorKind::InvalidPath(path.clone()))?;
        return Ok(WalkEntry::File(AssetFile::new(logical(relative)?, path, size)));
    }
    tracing::debug!(path = %path.display(), "Skipping entry that is neither a file nor a directory");
    Ok(WalkEntry::Skip)
}
