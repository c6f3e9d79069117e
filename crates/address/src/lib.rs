//! Content addressing for the asset store.
//!
//! Turns an asset (either its bytes or its logical path) into a short,
//! deterministic identifier and decides where that identifier lives in the
//! store:
//!
//! - **Hashing** behind a closed [`HashAlgorithm`] enum with a uniform
//!   [`digest`](HashAlgorithm::digest) capability, streaming large files in
//!   bounded chunks ([`HashAlgorithm::digest_reader`])
//! - **Truncation and encoding** via [`Addresser`], which keeps the leading
//!   `bits / 8` digest bytes and renders them with [`base62`]
//! - **Sharding** via [`shard::shard_key`] and [`shard::store_path`], which
//!   derive a two-character lowercase directory from fixed positions of the
//!   [`ShortId`]
//!
//! Truncation trades identifier length against collision probability: with
//! `bits` bits, roughly `2^(bits / 2)` distinct inputs give even odds of a
//! collision. Collisions are not detected here; see the release crate.

mod address;
pub mod base62;
mod construct;
mod digest;
pub mod error;
pub mod shard;
mod util;

pub use crate::address::{Address, Addresser, ShortId, normalize_path};
pub use crate::digest::{CHUNK_SIZE, Digester};
pub use crate::shard::ShardKey;

/// A supported hash algorithm.
///
/// Defaults to [`Sha512`](Self::Sha512), the widest digest on offer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HashAlgorithm {
    /// SHA-512 (512-bit, cryptographic)
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "sha-512"))]
    Sha512,
    /// SHA-256 (256-bit, cryptographic)
    #[cfg_attr(feature = "serde", serde(alias = "sha-256"))]
    Sha256,
    /// BLAKE3 (256-bit, cryptographic)
    Blake3,
    /// XXH3 (128-bit, fast non-cryptographic checksum)
    #[cfg_attr(feature = "serde", serde(alias = "xxh3-128"))]
    Xxh3,
}

/// What gets hashed to produce an asset's identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AddressMode {
    /// File bytes. Identical files share one stored object.
    #[default]
    Content,
    /// Normalized logical path. Stable across content edits.
    Path,
}

impl AddressMode {
    /// The algorithm used when none is configured for this mode.
    #[must_use]
    pub fn default_algorithm(&self) -> HashAlgorithm {
        match self {
            AddressMode::Content => HashAlgorithm::Sha512,
            AddressMode::Path => HashAlgorithm::Sha256,
        }
    }
}
