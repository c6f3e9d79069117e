//! Filesystem capabilities for building an asset store: enumerating source
//! trees into [`AssetFile`]s, and writing objects into a store through a
//! [`StoreBackend`].

pub mod backend;
pub mod error;
mod models;
mod path;
mod scan;

pub use crate::backend::StoreBackend;
pub use crate::models::AssetFile;
pub use crate::path::logical as logical_path;
pub use crate::path::validate as validate_path;
pub use crate::scan::{DEFAULT_EXCLUDES, enumerate};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StoreBackend + Send + Sync>;
