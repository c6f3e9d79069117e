//! Hashing Operations

use crate::HashAlgorithm;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sha2::{Digest, Sha256, Sha512};
use std::io::{ErrorKind as IoErrorKind, Read, Write};
use tracing::instrument;
use xxhash_rust::xxh3::Xxh3;

/// Bytes read per call when hashing a stream. Large assets (audio, texture
/// atlases) are hashed without ever being held in memory whole.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// An in-progress hash computation for one of the supported algorithms.
///
/// Implements [`Write`] so it can be the target of [`std::io::copy`].
pub enum Digester {
    Sha512(Sha512),
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
    Xxh3(Box<Xxh3>),
}

impl Digester {
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Xxh3 => Self::Xxh3(Box::new(Xxh3::new())),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha512(h) => Digest::update(h, bytes),
            Self::Sha256(h) => Digest::update(h, bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            },
            Self::Xxh3(h) => h.update(bytes),
        }
    }

    /// Consume the hasher, returning the full big-endian digest.
    #[must_use]
    pub fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha512(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
            Self::Xxh3(h) => h.digest128().to_be_bytes().to_vec(),
        }
    }
}

impl Write for Digester {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl HashAlgorithm {
    #[must_use]
    pub fn hasher(&self) -> Digester {
        Digester::new(*self)
    }

    /// Hash a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use stash_address::HashAlgorithm;
    ///
    /// let digest = HashAlgorithm::Sha256.digest(b"abc");
    /// assert_eq!(digest.len(), 32);
    /// assert_eq!(&digest[..4], &[0xBA, 0x78, 0x16, 0xBF]);
    /// ```
    #[must_use]
    pub fn digest(&self, input: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(input);
        hasher.finalize()
    }

    /// Hash everything a reader yields, [`CHUNK_SIZE`] bytes at a time.
    #[instrument(skip(reader), fields(algorithm = %self, input_size))]
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> Result<Vec<u8>> {
        let mut hasher = self.hasher();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut total = 0u64;
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => return Err(e).or_raise(|| ErrorKind::Io),
            };
            hasher.update(&buffer[..read]);
            total += read as u64;
        }
        tracing::Span::current().record("input_size", total);
        Ok(hasher.finalize())
    }
}
