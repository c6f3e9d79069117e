use crate::{AddressMode, HashAlgorithm};
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for HashAlgorithm {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl HashAlgorithm {
    /// Returns the short name for configuration (for displaying to user)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::Xxh3 => "xxh3",
        }
    }

    /// Digest length in bytes.
    #[inline]
    #[must_use]
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha512 => 64,
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 32,
            HashAlgorithm::Xxh3 => 16,
        }
    }

    /// Digest width in bits; the upper bound for truncation.
    #[inline]
    #[must_use]
    pub fn digest_bits(&self) -> u32 {
        self.digest_len() as u32 * 8
    }

    /// Whether finding two inputs with the same digest is computationally
    /// infeasible. XXH3 is fast but offers no such guarantee.
    #[inline]
    #[must_use]
    pub fn is_cryptographic(&self) -> bool {
        !matches!(self, HashAlgorithm::Xxh3)
    }
}

impl Display for AddressMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            AddressMode::Content => "content",
            AddressMode::Path => "path",
        })
    }
}
