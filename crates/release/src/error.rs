//! Release Error Types
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Every failure is fatal: the release stops at the first one.

use derive_more::{Display, Error};
use stash_config::error::{Error as ConfigError, ErrorKind as ConfigErrorKind};
use std::path::PathBuf;

/// A release error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a release failure.
///
/// ### Raised before the store is touched
/// - [`ErrorKind::InvalidConfiguration`]
/// - [`ErrorKind::Scan`]
/// - [`ErrorKind::Address`]
/// - [`ErrorKind::IdentifierTooShort`]
/// - [`ErrorKind::CollisionDetected`]
///
/// ### Raised while writing the store
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Manifest`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid configuration: {_0}")]
    InvalidConfiguration(#[error(not(source))] String),
    /// A source root could not be enumerated.
    #[display("failed to scan source root {}", _0.display())]
    Scan(#[error(not(source))] PathBuf),
    /// A file could not be read for hashing.
    #[display("failed to address {_0}")]
    Address(#[error(not(source))] String),
    /// A file's identifier is too short to pick a shard from.
    #[display("identifier for {_0} is too short to shard; increase the bit width")]
    IdentifierTooShort(#[error(not(source))] String),
    /// Two different files truncate to the same identifier.
    #[display("identifier collision at {store_path}: {first} and {second} differ but share an address")]
    CollisionDetected { first: String, second: String, store_path: String },
    /// The store backend failed to reset, copy or write.
    Storage,
    /// The manifest could not be encoded.
    Manifest,
}

impl ErrorKind {
    /// Convert a rejected configuration into a release error, keeping the
    /// config crate's `Exn` frame as a child in the error tree.
    #[track_caller]
    pub fn configuration(err: ConfigError) -> Error {
        let reason = match &*err {
            ConfigErrorKind::Invalid(reason) => reason.clone(),
            other => other.to_string(),
        };
        err.raise(ErrorKind::InvalidConfiguration(reason))
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ErrorKind::CollisionDetected {
            first: "src/a.lua".to_string(),
            second: "res/b.png".to_string(),
            store_path: "ab/xxaxxb".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "identifier collision at ab/xxaxxb: src/a.lua and res/b.png differ but share an address"
        );
        assert_eq!(ErrorKind::Scan(PathBuf::from("Resources/src")).to_string(), "failed to scan source root Resources/src");
        assert_eq!(ErrorKind::Storage.to_string(), "Storage");
    }

    #[test]
    fn test_configuration_keeps_reason() {
        let err = stash_config::release_addresser(stash_address::HashAlgorithm::Sha512, 40, "lookup").unwrap_err();
        let err = ErrorKind::configuration(err);
        assert_eq!(
            *err,
            ErrorKind::InvalidConfiguration("40 bits is below the 48-bit minimum for a release".to_string())
        );
    }
}
