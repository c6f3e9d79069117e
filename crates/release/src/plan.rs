use crate::error::{ErrorKind, Result};
use crate::settings::Settings;
use exn::ResultExt;
use rayon::prelude::*;
use stash_address::{Address, AddressMode, Addresser, shard};
use stash_storage::AssetFile;
use std::path::Path;
use tracing::instrument;

/// A source file with its computed address and store location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedFile {
    pub asset: AssetFile,
    pub address: Address,
    /// `{shard}/{id}`, relative to the store root.
    pub store_path: String,
}

/// Enumerate one source root and address every file in it.
///
/// Results come back in enumeration order (sorted by logical path) whether or
/// not hashing ran in parallel.
#[instrument(skip(settings, addresser), fields(files))]
pub(crate) fn plan_root(root: &Path, settings: &Settings, addresser: &Addresser) -> Result<Vec<PlannedFile>> {
    let files = stash_storage::enumerate(root, settings.excludes.as_slice()).or_raise(|| ErrorKind::Scan(root.to_path_buf()))?;
    tracing::Span::current().record("files", files.len());
    let mode = settings.mode;
    let planned: Vec<_> = if settings.parallel {
        files.into_par_iter().map(|asset| plan_file(asset, mode, addresser)).collect::<Result<_>>()?
    } else {
        files.into_iter().map(|asset| plan_file(asset, mode, addresser)).collect::<Result<_>>()?
    };
    tracing::info!(root = %root.display(), files = planned.len(), "Source root addressed");
    Ok(planned)
}

fn plan_file(asset: AssetFile, mode: AddressMode, addresser: &Addresser) -> Result<PlannedFile> {
    let address = addresser
        .address_asset(mode, &asset.logical_path, &asset.source)
        .or_raise(|| ErrorKind::Address(asset.logical_path.clone()))?;
    let store_path =
        shard::store_path(&address.id).or_raise(|| ErrorKind::IdentifierTooShort(asset.logical_path.clone()))?;
    tracing::debug!(logical = %asset.logical_path, store_path = %store_path, "Addressed");
    Ok(PlannedFile { asset, address, store_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use stash_address::HashAlgorithm;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("font")).unwrap();
        std::fs::write(dir.path().join("font/test.fnt"), b"info face=\"Arial\" size=32\n").unwrap();
        std::fs::write(dir.path().join("main.lua"), b"print(\"hello\")\n").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"finder junk").unwrap();
        dir
    }

    #[rstest]
    #[case::sequential(false)]
    #[case::parallel(true)]
    fn test_plan_root_content(#[case] parallel: bool) {
        let dir = tree();
        let settings = Settings {
            parallel,
            ..Settings::default()
        };
        let addresser = settings.validate().unwrap();
        let planned = plan_root(dir.path(), &settings, &addresser).unwrap();
        let paths: Vec<_> = planned.iter().map(|p| (p.asset.logical_path.as_str(), p.store_path.as_str())).collect();
        assert_eq!(paths, vec![("font/test.fnt", "ea/GEeeRaFOcbp"), ("main.lua", "i8/IRIBH8nzVbD")]);
        assert_eq!(planned[0].address.digest.len(), 64);
    }

    #[test]
    fn test_plan_root_path_mode() {
        let dir = tree();
        let settings = Settings {
            mode: AddressMode::Path,
            algorithm: HashAlgorithm::Sha256,
            bits: 80,
            ..Settings::default()
        };
        let addresser = settings.validate().unwrap();
        let planned = plan_root(dir.path(), &settings, &addresser).unwrap();
        // Path mode hashes the root-relative path, so the root's own name
        // doesn't matter.
        let font = planned.iter().find(|p| p.asset.logical_path == "font/test.fnt").unwrap();
        assert_eq!(font.address, addresser.address_path("font/test.fnt"));
    }

    #[test]
    fn test_plan_root_missing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let addresser = settings.validate().unwrap();
        let err = plan_root(&dir.path().join("missing"), &settings, &addresser).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Scan(_)));
    }
}
