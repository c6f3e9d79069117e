//! Addressing Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An addressing error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for addressing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bit width or algorithm choice can never produce a valid identifier.
    /// Fix the configuration; nothing has been touched yet.
    #[display("invalid configuration: {_0}")]
    InvalidConfiguration(#[error(not(source))] String),
    /// A character outside the base62 alphabet was found while decoding.
    #[display("invalid base62 character: {_0:?}")]
    InvalidCharacter(#[error(not(source))] char),
    /// Nothing to decode.
    #[display("empty identifier")]
    Empty,
    /// Decoded value does not fit the requested integer width.
    #[display("identifier overflows a 128-bit integer")]
    Overflow,
    /// Identifier has fewer characters than the shard rule reads from.
    #[display("identifier too short to shard: {_0:?}")]
    IdentifierTooShort(#[error(not(source))] String),
    /// Reading the input to hash failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io)
    }
}
