//! Shard planning.
//!
//! Every stored object lives one directory deep, in a shard named by two
//! characters of its [`ShortId`]: positions 2 and 5 (0-indexed), lowercased.
//! With 36 possible characters per position that caps the fan-out at 1296
//! shard directories.
//!
//! Shard names are never mixed-case: `aB` and `ab` must land in the same
//! directory on case-sensitive and case-insensitive filesystems alike.

use crate::ShortId;
use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Character positions read from the identifier.
pub const SHARD_POSITIONS: [usize; 2] = [2, 5];
/// Shortest identifier the shard rule can read from.
pub const MIN_ID_LEN: usize = SHARD_POSITIONS[1] + 1;

/// A two-character, lowercase shard directory name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShardKey([u8; 2]);

impl ShardKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ever built from ASCII alphanumerics.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl Display for ShardKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Derive the shard directory for an identifier.
///
/// # Errors
/// [`IdentifierTooShort`](ErrorKind::IdentifierTooShort) if the identifier
/// has fewer than [`MIN_ID_LEN`] characters.
///
/// ```
/// use stash_address::shard::shard_key;
/// let id = "GEeeRaFOcbp".parse().unwrap();
/// assert_eq!(shard_key(&id).unwrap().as_str(), "ea");
/// ```
pub fn shard_key(id: &ShortId) -> Result<ShardKey> {
    let bytes = id.as_str().as_bytes();
    if bytes.len() < MIN_ID_LEN {
        exn::bail!(ErrorKind::IdentifierTooShort(id.to_string()));
    }
    let [first, second] = SHARD_POSITIONS;
    Ok(ShardKey([bytes[first].to_ascii_lowercase(), bytes[second].to_ascii_lowercase()]))
}

/// Relative store location of an identifier: `{shard}/{id}`.
///
/// Always `/`-separated regardless of platform; this is the exact string
/// written to the manifest.
pub fn store_path(id: &ShortId) -> Result<String> {
    let shard = shard_key(id)?;
    Ok(format!("{shard}/{id}"))
}
