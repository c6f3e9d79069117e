use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use stash_address::{AddressMode, Addresser, HashAlgorithm};
use stash_config::{Config, release_addresser};
use stash_manifest::{MANIFEST_NAME, ManifestFormat};
use std::path::{Path, PathBuf};

/// Everything a [`StoreBuilder`](crate::StoreBuilder) needs to know, passed
/// explicitly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub mode: AddressMode,
    pub algorithm: HashAlgorithm,
    pub bits: u32,
    pub excludes: Vec<String>,
    pub parallel: bool,
    pub manifest_name: String,
    pub manifest_format: ManifestFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: AddressMode::Content,
            algorithm: AddressMode::Content.default_algorithm(),
            bits: 64,
            excludes: stash_storage::DEFAULT_EXCLUDES.iter().map(ToString::to_string).collect(),
            parallel: true,
            manifest_name: MANIFEST_NAME.to_string(),
            manifest_format: ManifestFormat::default(),
        }
    }
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            mode: config.mode,
            algorithm: config.algorithm(),
            bits: config.bits,
            excludes: config.excludes.clone(),
            parallel: config.parallel,
            manifest_name: config.manifest.name.clone(),
            manifest_format: config.manifest.format,
        }
    }
}

impl Settings {
    /// Check the settings and build the addresser they describe.
    pub fn validate(&self) -> Result<Addresser> {
        release_addresser(self.algorithm, self.bits, &self.manifest_name).map_err(ErrorKind::configuration)
    }
}

/// Check that the destination and the source roots don't overlap.
///
/// The store is wiped at the start of a release, so a destination equal to,
/// inside, or above a source root would destroy the input. Source roots must
/// exist; the destination need not.
pub fn check_layout<P: AsRef<Path>>(sources: &[P], destination: &Path) -> Result<PathBuf> {
    if sources.is_empty() {
        exn::bail!(ErrorKind::InvalidConfiguration("at least one source root is required".to_string()));
    }
    let destination = resolve(destination)?;
    for source in sources {
        let source = source.as_ref();
        let resolved = source.canonicalize().or_raise(|| ErrorKind::Scan(source.to_path_buf()))?;
        if destination.starts_with(&resolved) || resolved.starts_with(&destination) {
            exn::bail!(ErrorKind::InvalidConfiguration(format!(
                "destination {} overlaps source root {}",
                destination.display(),
                source.display()
            )));
        }
    }
    Ok(destination)
}

/// Absolute form of a path that may not exist yet, resolving symlinks through
/// the deepest ancestor that does.
fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .or_raise(|| ErrorKind::InvalidConfiguration(format!("unusable destination {}", path.display())))?;
    let mut existing = absolute.as_path();
    let mut rest = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return Ok(rest.iter().rev().fold(canonical, |acc, part| acc.join(part)));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name);
                existing = parent;
            },
            _ => return Ok(absolute),
        }
    }
}
