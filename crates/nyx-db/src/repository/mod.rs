//! Query repositories over the catalog tables.
//!
//! - [`CatalogRepository`] - package rows, keyed by (name, arch, repo)
//! - [`SyncStateRepository`] - last snapshot applied per repository tag

pub mod catalog;
pub mod sync_state;

pub use catalog::CatalogRepository;
pub use sync_state::SyncStateRepository;
