//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::{Path, PathBuf};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File or directory does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters, isn't UTF-8, or escapes root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Classify an I/O error, keeping the path for the cases a user can act on.
    pub fn from_io(err: IoError, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io(err),
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io() {
        let path = Path::new("res/font/test.fnt");
        let err = ErrorKind::from_io(IoError::new(std::io::ErrorKind::NotFound, "gone"), path);
        assert!(matches!(err, ErrorKind::NotFound(p) if p == path));
        let err = ErrorKind::from_io(IoError::new(std::io::ErrorKind::PermissionDenied, "no"), path);
        assert!(matches!(err, ErrorKind::PermissionDenied(_)));
        let err = ErrorKind::from_io(IoError::other("disk on fire"), path);
        assert!(matches!(err, ErrorKind::Io(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::NotFound(PathBuf::from("a/b")).to_string(), "file not found: a/b");
        assert_eq!(ErrorKind::InvalidPath(PathBuf::from("../x")).to_string(), "invalid path: ../x");
    }
}
