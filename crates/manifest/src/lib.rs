//! The lookup manifest.
//!
//! A single document maps every logical asset path to its location in the
//! store:
//!
//! ```text
//! {
//!     filenames: { "res/font/test.fnt": "ea/GEeeRaFOcbp", ... },
//!     metadata:  { version: 1 },
//! }
//! ```
//!
//! Keys are always emitted in sorted order (both the top-level keys and the
//! `filenames` mapping), so encoding the same mapping twice yields identical
//! bytes. The default encoding is an XML property list; binary property lists
//! and JSON are also available through [`ManifestFormat`].

pub mod error;
mod format;

pub use crate::format::ManifestFormat;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use stash_address::normalize_path;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Version written to (and the only version accepted from) `metadata.version`.
pub const MANIFEST_VERSION: u64 = 1;
/// File name of the manifest inside the store root.
pub const MANIFEST_NAME: &str = "lookup";

/// Logical path to `{shard}/{id}` store path.
pub type Mapping = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: u64,
}
impl Default for Metadata {
    fn default() -> Self {
        Self { version: MANIFEST_VERSION }
    }
}

/// The manifest document.
///
/// Field order matters: it is the key order of the encoded document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub filenames: Mapping,
    pub metadata: Metadata,
}

impl Manifest {
    pub fn new(filenames: Mapping) -> Self {
        Self {
            filenames,
            metadata: Metadata::default(),
        }
    }

    /// Merge per-root mappings in order. A logical path present in more than
    /// one mapping resolves to the last one.
    ///
    /// ```
    /// use stash_manifest::{Manifest, Mapping};
    ///
    /// let src = Mapping::from([("a/b".to_string(), "11/first".to_string())]);
    /// let res = Mapping::from([("a/b".to_string(), "22/second".to_string())]);
    /// let manifest = Manifest::merge([src, res]);
    /// assert_eq!(manifest.resolve("a/b"), Some("22/second"));
    /// ```
    pub fn merge(mappings: impl IntoIterator<Item = Mapping>) -> Self {
        let mut manifest = Self::default();
        for mapping in mappings {
            manifest.extend(mapping);
        }
        manifest
    }

    /// Add entries, replacing existing ones. Returns how many were replaced.
    pub fn extend(&mut self, mapping: Mapping) -> usize {
        let mut replaced = 0;
        for (logical, store) in mapping {
            if self.filenames.insert(logical, store).is_some() {
                replaced += 1;
            }
        }
        replaced
    }

    /// Store path for a logical path, the way the runtime looks it up
    /// (separators normalized, leading `./` ignored).
    pub fn resolve(&self, logical_path: &str) -> Option<&str> {
        match self.filenames.get(logical_path) {
            Some(store_path) => Some(store_path.as_str()),
            None => self.filenames.get(&normalize_path(logical_path)).map(String::as_str),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    /// Encode the manifest.
    pub fn to_bytes(&self, format: ManifestFormat) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        match format {
            ManifestFormat::XmlPlist => plist::to_writer_xml(&mut output, self).or_raise(|| ErrorKind::Encode)?,
            ManifestFormat::BinaryPlist => plist::to_writer_binary(&mut output, self).or_raise(|| ErrorKind::Encode)?,
            ManifestFormat::Json => {
                serde_json::to_writer_pretty(&mut output, self).or_raise(|| ErrorKind::Encode)?;
                output.push(b'\n');
            },
        }
        Ok(output)
    }

    /// Decode a manifest, detecting its format.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_slice_as(bytes, ManifestFormat::detect(bytes))
    }

    /// Decode a manifest in a known format.
    ///
    /// # Errors
    /// [`Decode`](ErrorKind::Decode) for malformed input and
    /// [`UnsupportedVersion`](ErrorKind::UnsupportedVersion) for a document
    /// this tool didn't write.
    pub fn from_slice_as(bytes: &[u8], format: ManifestFormat) -> Result<Self> {
        let manifest: Self = match format {
            ManifestFormat::XmlPlist | ManifestFormat::BinaryPlist => {
                plist::from_bytes(bytes).or_raise(|| ErrorKind::Decode)?
            },
            ManifestFormat::Json => serde_json::from_slice(bytes).or_raise(|| ErrorKind::Decode)?,
        };
        if manifest.metadata.version != MANIFEST_VERSION {
            exn::bail!(ErrorKind::UnsupportedVersion(manifest.metadata.version));
        }
        Ok(manifest)
    }

    /// Write the manifest to `path` as a whole, replacing any existing file.
    ///
    /// The document is staged in a temporary file in the same directory and
    /// renamed into place.
    pub fn write(&self, path: impl AsRef<Path>, format: ManifestFormat) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes(format)?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(parent).or_raise(|| ErrorKind::Io)?;
        staged.write_all(&bytes).or_raise(|| ErrorKind::Io)?;
        staged.persist(path).or_raise(|| ErrorKind::Io)?;
        tracing::info!(path = %path.display(), entries = self.len(), %format, "Manifest written");
        Ok(())
    }

    /// Read a manifest file, detecting its format.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref()).or_raise(|| ErrorKind::Io)?;
        Self::from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mapping(entries: &[(&str, &str)]) -> Mapping {
        entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn sample() -> Manifest {
        Manifest::new(mapping(&[
            ("src/main.lua", "i8/IRIBH8nzVbD"),
            ("res/font/test.fnt", "ea/GEeeRaFOcbp"),
            ("res/a b/ünïcode.png", "nd/4AntQDo5fC7"),
        ]))
    }

    #[rstest]
    #[case(ManifestFormat::XmlPlist)]
    #[case(ManifestFormat::BinaryPlist)]
    #[case(ManifestFormat::Json)]
    fn test_round_trip(#[case] format: ManifestFormat) {
        let manifest = sample();
        let bytes = manifest.to_bytes(format).unwrap();
        assert_eq!(ManifestFormat::detect(&bytes), format);
        let decoded = Manifest::from_slice(&bytes).unwrap();
        assert_eq!(decoded, manifest);
        let keys: Vec<_> = decoded.filenames.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["res/a b/ünïcode.png", "res/font/test.fnt", "src/main.lua"]);
    }

    #[rstest]
    #[case(ManifestFormat::XmlPlist)]
    #[case(ManifestFormat::BinaryPlist)]
    #[case(ManifestFormat::Json)]
    fn test_encoding_ignores_insertion_order(#[case] format: ManifestFormat) {
        let mut forwards = Manifest::default();
        let mut backwards = Manifest::default();
        let entries = [("a", "00/a"), ("b", "00/b"), ("c", "00/c")];
        for (k, v) in entries {
            forwards.extend(mapping(&[(k, v)]));
        }
        for (k, v) in entries.iter().rev() {
            backwards.extend(mapping(&[(k, v)]));
        }
        assert_eq!(forwards.to_bytes(format).unwrap(), backwards.to_bytes(format).unwrap());
    }

    #[test]
    fn test_xml_layout() {
        let xml = String::from_utf8(sample().to_bytes(ManifestFormat::XmlPlist).unwrap()).unwrap();
        let position = |needle: &str| xml.find(needle).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(position("<key>filenames</key>") < position("<key>metadata</key>"));
        assert!(position("<key>res/font/test.fnt</key>") < position("<key>src/main.lua</key>"));
        assert!(xml.contains("<string>ea/GEeeRaFOcbp</string>"));
        assert!(xml.contains("<key>version</key>"));
        assert!(xml.contains("<integer>1</integer>"));
    }

    #[test]
    fn test_merge_last_write_wins() {
        let src = mapping(&[("a/b", "11/first"), ("only/src", "33/src")]);
        let res = mapping(&[("a/b", "22/second"), ("only/res", "44/res")]);
        let manifest = Manifest::merge([src.clone(), res.clone()]);
        assert_eq!(manifest.resolve("a/b"), Some("22/second"));
        assert_eq!(manifest.len(), 3);
        let manifest = Manifest::merge([res, src]);
        assert_eq!(manifest.resolve("a/b"), Some("11/first"));
    }

    #[test]
    fn test_extend_counts_replacements() {
        let mut manifest = Manifest::new(mapping(&[("a", "1"), ("b", "2")]));
        assert_eq!(manifest.extend(mapping(&[("b", "3"), ("c", "4")])), 1);
        assert_eq!(manifest.resolve("b"), Some("3"));
    }

    #[rstest]
    #[case("res/font/test.fnt", Some("ea/GEeeRaFOcbp"))]
    #[case("./res/font/test.fnt", Some("ea/GEeeRaFOcbp"))]
    #[case("res\\font\\test.fnt", Some("ea/GEeeRaFOcbp"))]
    #[case("res/font/TEST.fnt", None)]
    #[case("missing", None)]
    fn test_resolve(#[case] logical: &str, #[case] expected: Option<&str>) {
        assert_eq!(sample().resolve(logical), expected);
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut manifest = sample();
        manifest.metadata.version = 2;
        let bytes = manifest.to_bytes(ManifestFormat::Json).unwrap();
        let err = Manifest::from_slice(&bytes).unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedVersion(2));
    }

    #[rstest]
    #[case(b"not a manifest")]
    #[case(b"{\"filenames\": 3}")]
    #[case(b"bplist00garbage")]
    fn test_rejects_garbage(#[case] bytes: &[u8]) {
        assert_eq!(*Manifest::from_slice(bytes).unwrap_err(), ErrorKind::Decode);
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_NAME);
        std::fs::write(&path, b"previous release").unwrap();
        let manifest = sample();
        manifest.write(&path, ManifestFormat::XmlPlist).unwrap();
        assert_eq!(Manifest::read(&path).unwrap(), manifest);
        let first = std::fs::read(&path).unwrap();
        manifest.write(&path, ManifestFormat::XmlPlist).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);
        // Only the manifest remains; no staging files.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_read_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(*Manifest::read(dir.path().join("lookup")).unwrap_err(), ErrorKind::Io);
    }
}
