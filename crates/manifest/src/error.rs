//! Manifest Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A manifest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for manifest operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document could not be serialized.
    #[display("failed to encode manifest")]
    Encode,
    /// Data is corrupt or not a manifest. Don't retry with the same input.
    #[display("invalid or corrupted manifest")]
    Decode,
    /// The requested serialization format is not supported.
    #[display("unsupported manifest format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The manifest was written by a newer (or older) release tool.
    #[display("unsupported manifest version: {_0}")]
    UnsupportedVersion(#[error(not(source))] u64),
    /// Reading or writing the manifest file failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}
