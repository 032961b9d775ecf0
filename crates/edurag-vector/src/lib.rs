//! LanceDB-backed per-subject vector index.

pub mod error;
pub mod manifest;
pub mod schema;
pub mod search;
pub mod store;
pub mod writer;

pub use error::StoreError;
pub use manifest::{Manifest, ManifestEntry};
pub use store::{IndexStore, SubjectHandle, SubjectIndex};
