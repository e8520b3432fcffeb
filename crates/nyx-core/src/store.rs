//! Storage seam of the reconciler.
//!
//! The reconciler only talks to the catalog through [`CatalogStore`] (reads
//! and the transaction boundary) and [`CatalogWriter`] (writes scoped to a
//! single repository tag). [`crate::SqliteCatalog`] and
//! [`crate::MemoryCatalog`] implement both.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nyx_registry::PackageRecord;
use serde::Serialize;

use crate::error::{Result, SyncError};

/// Primary key of a stored record.
pub type RecordId = i32;

/// A catalog record together with its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub record: PackageRecord,
}

/// Arch records of one package family, keyed by arch.
pub type Family = BTreeMap<String, StoredRecord>;

/// Last snapshot applied to a repository tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub repo: String,
    /// BLAKE3 hex digest of the snapshot blob.
    pub snapshot_digest: String,
    pub package_count: usize,
    pub synced_at: DateTime<Utc>,
}

/// Read access to the catalog and the write transaction boundary.
pub trait CatalogStore {
    /// First record of the `name` family in `repo`, by arch order.
    fn lookup(&self, name: &str, repo: &str) -> Result<Option<PackageRecord>>;

    fn lookup_arch(&self, name: &str, arch: &str, repo: &str) -> Result<Option<PackageRecord>>;

    /// All arch records of the `name` family in `repo`, ordered by arch.
    fn family(&self, name: &str, repo: &str) -> Result<Vec<PackageRecord>>;

    /// First record named `name` in any repository, ordered by repo then arch.
    fn lookup_any(&self, name: &str) -> Result<Option<PackageRecord>>;

    fn count(&self, repo: &str) -> Result<usize>;

    fn sync_status(&self, repo: &str) -> Result<Option<SyncStatus>>;

    fn sync_statuses(&self) -> Result<Vec<SyncStatus>>;

    /// Runs `f` in one write transaction restricted to `repo`.
    ///
    /// Either every write made through the writer is committed, or, when
    /// `f` returns an error, none of them is.
    fn transaction<T, F>(&self, repo: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn CatalogWriter) -> Result<T>;
}

/// Write access to the records of a single repository tag.
pub trait CatalogWriter {
    /// Repository tag this writer is restricted to.
    fn repo(&self) -> &str;

    /// Names of every family currently stored under the tag.
    fn family_names(&mut self) -> Result<Vec<String>>;

    fn family(&mut self, name: &str) -> Result<Family>;

    /// Inserts `records`; all of them must belong to the writer's tag.
    fn insert_batch(&mut self, records: &[PackageRecord]) -> Result<usize>;

    /// Overwrites every field of the record with `id`, keeping its identity.
    fn update(&mut self, id: RecordId, record: &PackageRecord) -> Result<()>;

    fn delete_family(&mut self, name: &str) -> Result<usize>;

    fn delete_arch(&mut self, name: &str, arch: &str) -> Result<usize>;

    fn record_sync_status(&mut self, digest: &str, package_count: usize) -> Result<()>;
}

/// Rejects `record` unless it belongs to `repo`.
pub(crate) fn ensure_repo(repo: &str, record: &PackageRecord) -> Result<()> {
    if record.repo == repo {
        Ok(())
    } else {
        Err(SyncError::RepoMismatch {
            name: record.name.clone(),
            arch: record.arch.clone(),
            expected: repo.to_string(),
            found: record.repo.clone(),
        })
    }
}
