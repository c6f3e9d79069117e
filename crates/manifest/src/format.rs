use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

const BINARY_PLIST_MAGIC: &[u8] = b"bplist00";

/// Serialization used for the manifest file.
///
/// Defaults to [`XmlPlist`](Self::XmlPlist), the dictionary format the game
/// runtime loads its file lookup table from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestFormat {
    /// XML property list
    #[default]
    #[serde(alias = "xml", alias = "plist")]
    XmlPlist,
    /// Binary property list (`bplist00`)
    #[serde(alias = "binary", alias = "bplist")]
    BinaryPlist,
    /// Pretty-printed JSON
    Json,
}

impl ManifestFormat {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ManifestFormat::XmlPlist => "xml-plist",
            ManifestFormat::BinaryPlist => "binary-plist",
            ManifestFormat::Json => "json",
        }
    }

    /// Guess the format of an encoded manifest from its leading bytes.
    ///
    /// Binary plists carry a magic header and JSON documents open with a
    /// brace; anything else is assumed to be XML.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(BINARY_PLIST_MAGIC) {
            return ManifestFormat::BinaryPlist;
        }
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => ManifestFormat::Json,
            _ => ManifestFormat::XmlPlist,
        }
    }
}

impl Display for ManifestFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xml" | "plist" | "xml-plist" => Ok(ManifestFormat::XmlPlist),
            "binary" | "bplist" | "binary-plist" => Ok(ManifestFormat::BinaryPlist),
            "json" => Ok(ManifestFormat::Json),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}
