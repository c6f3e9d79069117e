//! Release orchestration: turns ordered source roots into a sharded,
//! content-addressed store plus the `lookup` manifest that maps every
//! logical asset path to its stored object.
//!
//! Use [`StoreBuilder`] directly to release into any
//! [`StoreBackend`](stash_storage::StoreBackend), or [`release`] to run a
//! [`Config`] against the local filesystem.

mod builder;
mod conflict;
pub mod error;
mod plan;
mod settings;

pub use crate::builder::{Release, ReleaseStats, StoreBuilder};
pub use crate::plan::PlannedFile;
pub use crate::settings::{Settings, check_layout};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
pub use stash_config::MIN_RELEASE_BITS;
use stash_config::Config;
use stash_storage::BackendHandle;
use stash_storage::backend::LocalBackend;
use std::sync::Arc;

/// Run a full release described by `config` on the local filesystem.
///
/// Every check (configuration, layout, scanning, addressing, collisions)
/// happens before the destination is wiped.
pub fn release(config: &Config) -> Result<Release> {
    config.validate().map_err(ErrorKind::configuration)?;
    let builder = StoreBuilder::new(Settings::from(config))?;
    let destination = check_layout(config.sources.as_slice(), &config.destination)?;
    tracing::info!(destination = %destination.display(), sources = ?config.sources, "Starting release");
    let backend: BackendHandle = Arc::new(LocalBackend::new("local", &destination).or_raise(|| ErrorKind::Storage)?);
    builder.release(config.sources.as_slice(), &backend)
}
