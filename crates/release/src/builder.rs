use crate::conflict::{Objects, resolve_objects};
use crate::error::{ErrorKind, Result};
use crate::plan::{PlannedFile, plan_root};
use crate::settings::Settings;
use exn::ResultExt;
use rayon::prelude::*;
use stash_address::Addresser;
use stash_manifest::{Manifest, Mapping};
use stash_storage::BackendHandle;
use std::path::Path;
use tracing::instrument;

/// Outcome of a successful release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Release {
    /// The manifest written to the store.
    pub manifest: Manifest,
    pub stats: ReleaseStats,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReleaseStats {
    /// Files found across all source roots.
    pub files: usize,
    /// Objects copied into the store.
    pub objects: usize,
    /// Files that shared an object with another file.
    pub duplicates: usize,
    /// Bytes copied into the store, excluding the manifest.
    pub bytes: u64,
    /// Manifest entries replaced by a later source root.
    pub overridden: usize,
}

/// Builds a store from an ordered list of source roots.
///
/// Each release is a full rebuild:
///
/// 1. every root is enumerated and every file addressed and given a store
///    path, in root order;
/// 2. store paths are checked for truncation collisions;
/// 3. the store is reset, then one object per store path is copied in;
/// 4. per-root mappings are merged in root order (a later root wins a shared
///    logical path) and the manifest is written last.
///
/// Nothing in the store is touched until steps 1 and 2 have succeeded.
///
/// # Examples
///
/// ```no_run
/// use stash_release::{Settings, StoreBuilder};
/// use stash_storage::BackendHandle;
/// use stash_storage::backend::LocalBackend;
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend: BackendHandle = Arc::new(LocalBackend::new("local", "/srv/game/gdatas")?);
/// let builder = StoreBuilder::new(Settings::default())?;
/// let release = builder.release(&["/srv/game/src", "/srv/game/res"], &backend)?;
/// println!("{} objects", release.stats.objects);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct StoreBuilder {
    settings: Settings,
    addresser: Addresser,
}

impl StoreBuilder {
    /// # Errors
    /// [`InvalidConfiguration`](ErrorKind::InvalidConfiguration) if the
    /// settings can't produce shardable identifiers.
    pub fn new(settings: Settings) -> Result<Self> {
        let addresser = settings.validate()?;
        if !addresser.algorithm().is_cryptographic() {
            tracing::warn!(
                algorithm = %addresser.algorithm(),
                "Identifiers come from a non-cryptographic hash; crafted files can collide"
            );
        }
        Ok(Self { settings, addresser })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Address every file of every root without touching the store.
    pub fn plan<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Vec<Vec<PlannedFile>>> {
        if roots.is_empty() {
            exn::bail!(ErrorKind::InvalidConfiguration("at least one source root is required".to_string()));
        }
        roots.iter().map(|root| plan_root(root.as_ref(), &self.settings, &self.addresser)).collect()
    }

    /// Rebuild the store behind `backend` from `roots`.
    #[instrument(skip_all, fields(store = backend.name(), roots = roots.len(), algorithm = %self.addresser.algorithm(), bits = self.addresser.bits()))]
    pub fn release<P: AsRef<Path>>(&self, roots: &[P], backend: &BackendHandle) -> Result<Release> {
        let planned = self.plan(roots)?;
        let resolved = resolve_objects(&planned)?;

        backend.reset().or_raise(|| ErrorKind::Storage)?;
        let bytes = self.copy_objects(&resolved, backend)?;

        let mut manifest = Manifest::default();
        let mut overridden = 0;
        for root in &planned {
            let mapping: Mapping =
                root.iter().map(|file| (file.asset.logical_path.clone(), file.store_path.clone())).collect();
            overridden += manifest.extend(mapping);
        }
        let encoded = manifest.to_bytes(self.settings.manifest_format).or_raise(|| ErrorKind::Manifest)?;
        backend.write(Path::new(&self.settings.manifest_name), &encoded).or_raise(|| ErrorKind::Storage)?;

        let stats = ReleaseStats {
            files: planned.iter().map(Vec::len).sum(),
            objects: resolved.objects.len(),
            duplicates: resolved.duplicates,
            bytes,
            overridden,
        };
        tracing::info!(
            files = stats.files,
            objects = stats.objects,
            duplicates = stats.duplicates,
            bytes = stats.bytes,
            overridden = stats.overridden,
            entries = manifest.len(),
            "Release complete"
        );
        Ok(Release { manifest, stats })
    }

    fn copy_objects(&self, resolved: &Objects<'_>, backend: &BackendHandle) -> Result<u64> {
        let put = |file: &&PlannedFile| -> Result<u64> {
            tracing::debug!(logical = %file.asset.logical_path, store_path = %file.store_path, "Copying");
            backend.put(Path::new(&file.store_path), &file.asset.source).or_raise(|| ErrorKind::Storage)
        };
        let sizes: Vec<u64> = if self.settings.parallel {
            resolved.objects.par_iter().map(|(_, file)| put(file)).collect::<Result<_>>()?
        } else {
            resolved.objects.values().map(put).collect::<Result<_>>()?
        };
        Ok(sizes.into_iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_address::{AddressMode, HashAlgorithm};
    use stash_manifest::ManifestFormat;
    use stash_storage::backend::{MockBackend, StoreBackend};
    use std::path::PathBuf;
    use std::sync::Arc;

    const FONT: &[u8] = b"info face=\"Arial\" size=32\n";

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn file(&self, relative: &str, data: &[u8]) -> &Self {
            let path = self.dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, data).unwrap();
            self
        }

        fn root(&self, name: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::create_dir_all(&path).unwrap();
            path
        }
    }

    fn mock() -> (Arc<MockBackend>, BackendHandle) {
        let mock = Arc::new(MockBackend::with_files([("stale/leftover", b"old")]));
        let handle: BackendHandle = mock.clone();
        (mock, handle)
    }

    #[test]
    fn test_release_into_mock() {
        let fixture = Fixture::new();
        fixture
            .file("src/main.lua", b"print(\"hello\")\n")
            .file("res/font/test.fnt", FONT)
            .file("res/.DS_Store", b"junk");
        let roots = [fixture.root("src"), fixture.root("res")];
        let (mock, backend) = mock();

        let release = StoreBuilder::new(Settings::default()).unwrap().release(&roots, &backend).unwrap();

        assert_eq!(release.manifest.resolve("font/test.fnt"), Some("ea/GEeeRaFOcbp"));
        assert_eq!(release.manifest.resolve("main.lua"), Some("i8/IRIBH8nzVbD"));
        let files = mock.files();
        let paths: Vec<_> = files.keys().cloned().collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("ea/GEeeRaFOcbp"), PathBuf::from("i8/IRIBH8nzVbD"), PathBuf::from("lookup")]
        );
        assert_eq!(files[&PathBuf::from("ea/GEeeRaFOcbp")], FONT);
        let stored = Manifest::from_slice(&files[&PathBuf::from("lookup")]).unwrap();
        assert_eq!(stored, release.manifest);
        assert_eq!(
            release.stats,
            ReleaseStats {
                files: 2,
                objects: 2,
                duplicates: 0,
                bytes: (FONT.len() + 15) as u64,
                overridden: 0,
            }
        );
    }

    #[test]
    fn test_later_root_wins() {
        let fixture = Fixture::new();
        fixture
            .file("src/config.lua", b"version one\n")
            .file("res/config.lua", b"version two\n")
            .file("res/copy.lua", b"version one\n");
        let roots = [fixture.root("src"), fixture.root("res")];
        let (mock, backend) = mock();

        let release = StoreBuilder::new(Settings::default()).unwrap().release(&roots, &backend).unwrap();

        assert_eq!(release.manifest.resolve("config.lua"), Some("pv/J1pZWVB7inz"));
        assert_eq!(release.manifest.resolve("copy.lua"), Some("fy/3kFoSyDb2JV"));
        assert_eq!(release.stats.overridden, 1);
        assert_eq!(release.stats.duplicates, 1);
        assert_eq!(release.stats.objects, 2);
        // The overridden object is still stored; only the manifest forgets it.
        assert!(backend.exists(Path::new("fy/3kFoSyDb2JV")).unwrap());
        assert_eq!(mock.files().len(), 3);
    }

    #[test]
    fn test_path_mode_later_root_bytes_win() {
        let fixture = Fixture::new();
        fixture.file("src/font/test.fnt", b"old font\n").file("res/font/test.fnt", FONT);
        let roots = [fixture.root("src"), fixture.root("res")];
        let (mock, backend) = mock();
        let settings = Settings {
            mode: AddressMode::Path,
            algorithm: HashAlgorithm::Sha256,
            manifest_format: ManifestFormat::Json,
            ..Settings::default()
        };

        let release = StoreBuilder::new(settings).unwrap().release(&roots, &backend).unwrap();

        assert_eq!(release.manifest.resolve("font/test.fnt"), Some("3g/2C3nSgdoC8X"));
        assert_eq!(mock.files()[&PathBuf::from("3g/2C3nSgdoC8X")], FONT);
        assert_eq!(release.stats.duplicates, 1);
        assert_eq!(release.stats.overridden, 1);
    }

    #[test]
    fn test_invalid_settings_touch_nothing() {
        let err = StoreBuilder::new(Settings {
            bits: 0,
            ..Settings::default()
        })
        .unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidConfiguration(_)));
    }

    #[test]
    fn test_xxh3_still_builds() {
        let fixture = Fixture::new();
        fixture.file("src/main.lua", b"print(\"hello\")\n");
        let (mock, backend) = mock();
        let settings = Settings {
            algorithm: HashAlgorithm::Xxh3,
            bits: 128,
            ..Settings::default()
        };
        let release = StoreBuilder::new(settings).unwrap().release(&[fixture.root("src")], &backend).unwrap();
        assert_eq!(release.stats.objects, 1);
        assert_eq!(mock.files().len(), 2);
    }

    #[test]
    fn test_failed_scan_keeps_store() {
        let fixture = Fixture::new();
        let (mock, backend) = mock();
        let builder = StoreBuilder::new(Settings::default()).unwrap();

        let err = builder.release(&[fixture.dir.path().join("missing")], &backend).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Scan(_)));
        let err = builder.release::<PathBuf>(&[], &backend).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidConfiguration(_)));
        assert_eq!(mock.files().len(), 1);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let fixture = Fixture::new();
        for i in 0..32 {
            fixture.file(&format!("src/{i:02}.txt"), format!("asset {i}\n").as_bytes());
        }
        let roots = [fixture.root("src")];
        let run = |parallel| {
            let (mock, backend) = mock();
            let settings = Settings {
                parallel,
                ..Settings::default()
            };
            let release = StoreBuilder::new(settings).unwrap().release(&roots, &backend).unwrap();
            (release, mock.files())
        };
        assert_eq!(run(true), run(false));
    }
}
