use crate::error::{ErrorKind, Result};
use crate::plan::PlannedFile;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// The set of objects a release will write, one per store path.
#[derive(Debug, Default)]
pub(crate) struct Objects<'a> {
    /// Lowercased store path to the file whose bytes end up there.
    pub objects: BTreeMap<String, &'a PlannedFile>,
    /// Files that resolved to an already-planned object with the same digest.
    pub duplicates: usize,
}

/// Fold every planned file, across all roots in order, into one object per
/// store path.
///
/// Two files with the same store path and the same full digest are the same
/// object: the later one is kept (identical bytes in content mode, the later
/// root's copy in path mode). Two files with the same store path but different
/// digests are a truncation collision and abort the release.
///
/// Store paths are compared ignoring ASCII case: identifiers differing only in
/// case share a shard directory and are one file on a case-insensitive
/// filesystem.
pub(crate) fn resolve_objects(roots: &[Vec<PlannedFile>]) -> Result<Objects<'_>> {
    let mut resolved = Objects::default();
    for planned in roots.iter().flatten() {
        match resolved.objects.entry(planned.store_path.to_ascii_lowercase()) {
            Entry::Vacant(slot) => {
                slot.insert(planned);
            },
            Entry::Occupied(mut slot) if slot.get().address.digest == planned.address.digest => {
                tracing::trace!(logical = %planned.asset.logical_path, store_path = %planned.store_path, "Duplicate object");
                resolved.duplicates += 1;
                slot.insert(planned);
            },
            Entry::Occupied(slot) => {
                let first = slot.get();
                tracing::error!(
                    first = %first.asset.logical_path,
                    second = %planned.asset.logical_path,
                    first_path = %first.store_path,
                    second_path = %planned.store_path,
                    "Identifier collision"
                );
                exn::bail!(ErrorKind::CollisionDetected {
                    first: first.asset.logical_path.clone(),
                    second: planned.asset.logical_path.clone(),
                    store_path: planned.store_path.clone(),
                });
            },
        }
    }
    Ok(resolved)
}
