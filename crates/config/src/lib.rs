//! Release configuration.
//!
//! A [`Config`] is assembled from layered sources, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. a configuration file: the path given explicitly, otherwise
//!    `stash.toml` in the working directory, otherwise `stash.toml` in the
//!    user configuration directory (TOML, YAML or JSON by extension)
//! 3. `STASH_`-prefixed environment variables, with `__` separating nested
//!    keys (`STASH_MANIFEST__FORMAT=json`)
//!
//! Command-line overrides are applied by the caller on the extracted value.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use stash_address::{AddressMode, Addresser, HashAlgorithm};
use stash_manifest::{MANIFEST_NAME, ManifestFormat};
use stash_storage::DEFAULT_EXCLUDES;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "stash.toml";
pub const ENV_PREFIX: &str = "STASH_";
pub const DEFAULT_BITS: u32 = 64;

/// Narrowest identifier a release accepts.
///
/// At 48 bits roughly 3 in a million identifiers come out shorter than the
/// six characters the shard rule reads; at 64 bits it is about 5 in 100
/// billion. A short identifier that still turns up aborts the release.
pub const MIN_RELEASE_BITS: u32 = 48;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source roots, in merge order: a logical path found in several roots
    /// resolves to the last one.
    pub sources: Vec<PathBuf>,
    /// Store root. Wiped at the start of every release.
    pub destination: PathBuf,
    pub mode: AddressMode,
    /// Hash algorithm. When unset, the mode's default is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<HashAlgorithm>,
    /// Digest bits kept for the identifier.
    pub bits: u32,
    /// File and directory names skipped while scanning sources.
    pub excludes: Vec<String>,
    /// Hash the files of a root on a thread pool.
    pub parallel: bool,
    pub manifest: ManifestConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: vec![PathBuf::from("Resources/src"), PathBuf::from("Resources/res")],
            destination: PathBuf::from("Resources/gdatas"),
            mode: AddressMode::default(),
            algorithm: None,
            bits: DEFAULT_BITS,
            excludes: DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect(),
            parallel: true,
            manifest: ManifestConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// File name of the manifest inside the store root.
    pub name: String,
    pub format: ManifestFormat,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            name: MANIFEST_NAME.to_string(),
            format: ManifestFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, a file and the environment.
    ///
    /// An explicitly requested file must exist; the implicit locations are
    /// skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => {
                exn::bail!(ErrorKind::Invalid(format!("configuration file not found: {}", path.display())));
            },
            Some(path) => Some(path.to_path_buf()),
            None => default_file(),
        };
        let config: Self = Self::figment(file.as_deref()).extract().or_raise(|| ErrorKind::Load)?;
        tracing::debug!(file = ?file, "Configuration loaded");
        config.validate()?;
        Ok(config)
    }

    /// The layered provider chain, without extraction.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = match file.extension().and_then(|ext| ext.to_str()) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__").ignore(&["config"]))
    }

    /// The configured algorithm, or the default for the addressing mode.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm.unwrap_or_else(|| self.mode.default_algorithm())
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.destination.join(&self.manifest.name)
    }

    /// Check the values that can be judged without touching the filesystem.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            exn::bail!(ErrorKind::Invalid("at least one source root is required".to_string()));
        }
        if self.destination.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Invalid("destination must not be empty".to_string()));
        }
        release_addresser(self.algorithm(), self.bits, &self.manifest.name)?;
        if self.excludes.iter().any(|name| name.is_empty() || name.contains(['/', '\\'])) {
            exn::bail!(ErrorKind::Invalid("excludes must be plain file names".to_string()));
        }
        Ok(())
    }
}

/// Check the addressing and manifest settings of a release and build the
/// addresser they describe.
///
/// Shared by [`Config::validate`] and release settings that never went
/// through a [`Config`].
pub fn release_addresser(algorithm: HashAlgorithm, bits: u32, manifest_name: &str) -> Result<Addresser> {
    let addresser =
        Addresser::new(algorithm, bits).or_raise(|| ErrorKind::Invalid(format!("unusable bit width {bits} for {algorithm}")))?;
    if bits < MIN_RELEASE_BITS {
        exn::bail!(ErrorKind::Invalid(format!("{bits} bits is below the {MIN_RELEASE_BITS}-bit minimum for a release")));
    }
    let name = Path::new(manifest_name);
    if manifest_name.is_empty() || name.file_name() != Some(name.as_os_str()) {
        exn::bail!(ErrorKind::Invalid(format!("manifest name must be a plain file name: {manifest_name:?}")));
    }
    // Shard directories are exactly two characters long.
    if manifest_name.chars().count() == 2 {
        exn::bail!(ErrorKind::Invalid(format!("manifest name {manifest_name:?} would clash with a shard directory")));
    }
    Ok(addresser)
}

/// `stash.toml` in the working directory, then in the user config directory.
fn default_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    let user = directories::ProjectDirs::from("", "", "stash")?.config_dir().join(CONFIG_FILE_NAME);
    user.is_file().then_some(user)
}
