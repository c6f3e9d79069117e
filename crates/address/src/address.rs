use crate::error::{Error, ErrorKind, Result};
use crate::{AddressMode, HashAlgorithm, base62};
use exn::ResultExt;
use regex::Regex;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

static REPEATED_SLASHES: LazyLock<Regex> = LazyLock::new(|| Regex::new("/{2,}").unwrap());

/// Normalize a logical path before hashing it.
///
/// Backslashes become forward slashes, runs of slashes collapse into one, and
/// a single leading `./` is dropped. Nothing else is touched: case, `..`
/// segments and trailing slashes are all significant.
///
/// ```
/// use stash_address::normalize_path;
/// assert_eq!(normalize_path(".\\res\\font//test.fnt"), "res/font/test.fnt");
/// assert_eq!(normalize_path("res/font/test.fnt"), "res/font/test.fnt");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = REPEATED_SLASHES.replace_all(&path, "/");
    match path.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => path.into_owned(),
    }
}

/// A base62-encoded, truncated digest.
///
/// Variable length: small values produce short strings. Only ever contains
/// characters from [`base62::ALPHABET`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShortId(String);

impl ShortId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for ShortId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShortId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ShortId {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            exn::bail!(ErrorKind::Empty);
        }
        if let Some(c) = s.chars().find(|c| !c.is_ascii_alphanumeric()) {
            exn::bail!(ErrorKind::InvalidCharacter(c));
        }
        Ok(Self(s.to_string()))
    }
}

/// The outcome of addressing one input.
///
/// The full digest is kept alongside the identifier so that two inputs
/// truncated to the same [`ShortId`] can be told apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    pub id: ShortId,
    pub digest: Vec<u8>,
}

/// Produces [`ShortId`]s with a fixed algorithm and bit width.
///
/// # Examples
///
/// ```
/// use stash_address::{Addresser, HashAlgorithm};
///
/// let addresser = Addresser::new(HashAlgorithm::Sha256, 80).unwrap();
/// let address = addresser.address_path("res/font/test.fnt");
/// assert_eq!(address.id.as_str(), "4BKTEX2rqICDcv");
///
/// // Widths must be whole bytes.
/// assert!(Addresser::new(HashAlgorithm::Sha256, 60).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Addresser {
    algorithm: HashAlgorithm,
    bits: u32,
}

impl Addresser {
    /// # Errors
    /// [`InvalidConfiguration`](ErrorKind::InvalidConfiguration) unless `bits`
    /// is a positive multiple of 8 no wider than the algorithm's digest.
    pub fn new(algorithm: HashAlgorithm, bits: u32) -> Result<Self> {
        if bits == 0 || bits % 8 != 0 {
            exn::bail!(ErrorKind::InvalidConfiguration(format!(
                "bit width must be a positive multiple of 8, got {bits}"
            )));
        }
        if bits > algorithm.digest_bits() {
            exn::bail!(ErrorKind::InvalidConfiguration(format!(
                "{bits} bits exceeds the {}-bit {algorithm} digest",
                algorithm.digest_bits()
            )));
        }
        Ok(Self { algorithm, bits })
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Address an in-memory byte slice.
    #[must_use]
    pub fn address_bytes(&self, bytes: &[u8]) -> Address {
        self.finish(self.algorithm.digest(bytes))
    }

    /// Address everything a reader yields, streamed in bounded chunks.
    pub fn address_reader<R: Read>(&self, reader: R) -> Result<Address> {
        Ok(self.finish(self.algorithm.digest_reader(reader)?))
    }

    /// Address the contents of a file on disk.
    pub fn address_file(&self, path: impl AsRef<Path>) -> Result<Address> {
        let file = File::open(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        self.address_reader(file)
    }

    /// Address a logical path (after [`normalize_path`]).
    #[must_use]
    pub fn address_path(&self, logical_path: &str) -> Address {
        self.address_bytes(normalize_path(logical_path).as_bytes())
    }

    /// Address an asset according to `mode`: its bytes (read from `source`)
    /// or its logical path.
    pub fn address_asset(&self, mode: AddressMode, logical_path: &str, source: impl AsRef<Path>) -> Result<Address> {
        match mode {
            AddressMode::Content => self.address_file(source),
            AddressMode::Path => Ok(self.address_path(logical_path)),
        }
    }

    fn finish(&self, digest: Vec<u8>) -> Address {
        // Leading bytes are the most significant once read big-endian.
        let truncated = &digest[..(self.bits / 8) as usize];
        let id = ShortId(base62::encode_bytes(truncated));
        Address { id, digest }
    }
}
