//! Snapshot reconciliation for the nyx package catalog.
//!
//! [`Synchronizer::synchronize`] reads a repository snapshot, parses each
//! package entry and reconciles the catalog records of that repository tag
//! with it in a single transaction: families and arches missing from the
//! snapshot are deleted, changed records are updated in place and new ones
//! are inserted in batches. [`Synchronizer::lookup`] is the read path.
//!
//! ```no_run
//! use nyx_core::{SqliteCatalog, SyncOptions, Synchronizer};
//!
//! # fn main() -> nyx_core::Result<()> {
//! let store = SqliteCatalog::open("/var/lib/nyx/pkginfo.db")?;
//! let sync = Synchronizer::new(store, SyncOptions::default());
//!
//! let blob = std::fs::read("archlinuxcn.db").unwrap_or_default();
//! let report = sync.synchronize("archlinuxcn", &blob)?;
//! println!("{} new, {} updated", report.inserted, report.updated);
//!
//! if let Some(pkg) = sync.lookup("yay", "archlinuxcn")? {
//!     println!("{} {}", pkg.name, pkg.version);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod plan;
pub mod snapshot;
pub mod sqlite;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Result, SyncError};
pub use memory::MemoryCatalog;
pub use plan::{SyncPlan, SyncReport};
pub use snapshot::Snapshot;
pub use sqlite::SqliteCatalog;
pub use store::{CatalogStore, CatalogWriter, Family, RecordId, StoredRecord, SyncStatus};
pub use sync::{snapshot_digest, SyncOptions, Synchronizer};
