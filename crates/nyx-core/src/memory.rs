//! In-memory catalog, mainly for tests and embedding.

use std::{
    collections::BTreeMap,
    sync::{Mutex, RwLock},
};

use chrono::Utc;
use nyx_db::DbError;
use nyx_registry::PackageRecord;

use crate::{
    error::{Result, SyncError},
    store::{ensure_repo, CatalogStore, CatalogWriter, Family, RecordId, StoredRecord, SyncStatus},
};

#[derive(Debug, Clone, Default)]
struct State {
    next_id: RecordId,
    rows: BTreeMap<RecordId, PackageRecord>,
    sync: BTreeMap<String, SyncStatus>,
}

impl State {
    fn find(&self, name: &str, repo: &str) -> impl Iterator<Item = (&RecordId, &PackageRecord)> {
        let (name, repo) = (name.to_string(), repo.to_string());
        self.rows
            .iter()
            .filter(move |(_, r)| r.name == name && r.repo == repo)
    }

    fn sorted_family(&self, name: &str, repo: &str) -> Vec<PackageRecord> {
        let mut family: Vec<_> = self.find(name, repo).map(|(_, r)| r.clone()).collect();
        family.sort_by(|a, b| a.arch.cmp(&b.arch));
        family
    }

    /// Checks the filename and slot uniqueness constraints for `record`
    /// stored under `id`.
    fn check_unique(&self, id: RecordId, record: &PackageRecord) -> Result<()> {
        for (other_id, other) in &self.rows {
            if *other_id == id {
                continue;
            }
            if other.filename == record.filename {
                return Err(constraint(format!(
                    "UNIQUE constraint failed: packages.filename ({})",
                    record.filename
                )));
            }
            if other.same_slot(record) {
                return Err(constraint(format!(
                    "UNIQUE constraint failed: packages slot ({}, {}, {})",
                    record.name, record.arch, record.repo
                )));
            }
        }
        Ok(())
    }
}

fn constraint(message: String) -> SyncError {
    SyncError::Db(DbError::ConstraintViolation(message))
}

/// Catalog held in process memory with the same constraints as the
/// SQLite schema.
///
/// A transaction works on a copy of the state that replaces the live state
/// on commit, so readers only ever see committed data.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<State>,
    writer: Mutex<()>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T> {
        let state = self.state.read().map_err(|_| SyncError::PoisonError)?;
        Ok(f(&state))
    }

    /// Every stored record, ordered by repo, name and arch.
    pub fn records(&self) -> Result<Vec<PackageRecord>> {
        self.read(|state| {
            let mut records: Vec<_> = state.rows.values().cloned().collect();
            records.sort_by(|a, b| {
                (&a.repo, &a.name, &a.arch).cmp(&(&b.repo, &b.name, &b.arch))
            });
            records
        })
    }
}

impl CatalogStore for MemoryCatalog {
    fn lookup(&self, name: &str, repo: &str) -> Result<Option<PackageRecord>> {
        self.read(|state| state.sorted_family(name, repo).into_iter().next())
    }

    fn lookup_arch(&self, name: &str, arch: &str, repo: &str) -> Result<Option<PackageRecord>> {
        self.read(|state| {
            state
                .find(name, repo)
                .find(|(_, r)| r.arch == arch)
                .map(|(_, r)| r.clone())
        })
    }

    fn family(&self, name: &str, repo: &str) -> Result<Vec<PackageRecord>> {
        self.read(|state| state.sorted_family(name, repo))
    }

    fn lookup_any(&self, name: &str) -> Result<Option<PackageRecord>> {
        self.read(|state| {
            state
                .rows
                .values()
                .filter(|r| r.name == name)
                .min_by(|a, b| (&a.repo, &a.arch).cmp(&(&b.repo, &b.arch)))
                .cloned()
        })
    }

    fn count(&self, repo: &str) -> Result<usize> {
        self.read(|state| state.rows.values().filter(|r| r.repo == repo).count())
    }

    fn sync_status(&self, repo: &str) -> Result<Option<SyncStatus>> {
        self.read(|state| state.sync.get(repo).cloned())
    }

    fn sync_statuses(&self) -> Result<Vec<SyncStatus>> {
        self.read(|state| state.sync.values().cloned().collect())
    }

    fn transaction<T, F>(&self, repo: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn CatalogWriter) -> Result<T>,
    {
        let _guard = self.writer.lock().map_err(|_| SyncError::PoisonError)?;
        let mut working = self.read(State::clone)?;

        let value = f(&mut MemoryWriter {
            state: &mut working,
            repo,
        })?;

        *self.state.write().map_err(|_| SyncError::PoisonError)? = working;
        Ok(value)
    }
}

struct MemoryWriter<'a> {
    state: &'a mut State,
    repo: &'a str,
}

impl CatalogWriter for MemoryWriter<'_> {
    fn repo(&self) -> &str {
        self.repo
    }

    fn family_names(&mut self) -> Result<Vec<String>> {
        let mut names: Vec<_> = self
            .state
            .rows
            .values()
            .filter(|r| r.repo == self.repo)
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn family(&mut self, name: &str) -> Result<Family> {
        Ok(self
            .state
            .find(name, self.repo)
            .map(|(id, record)| {
                (
                    record.arch.clone(),
                    StoredRecord {
                        id: *id,
                        record: record.clone(),
                    },
                )
            })
            .collect())
    }

    fn insert_batch(&mut self, records: &[PackageRecord]) -> Result<usize> {
        for record in records {
            ensure_repo(self.repo, record)?;
            let id = self.state.next_id + 1;
            self.state.check_unique(id, record)?;
            self.state.rows.insert(id, record.clone());
            self.state.next_id = id;
        }
        Ok(records.len())
    }

    fn update(&mut self, id: RecordId, record: &PackageRecord) -> Result<()> {
        ensure_repo(self.repo, record)?;
        match self.state.rows.get(&id) {
            Some(existing) if existing.repo == self.repo => {}
            _ => return Err(SyncError::Db(DbError::NotFound(format!("package #{id}")))),
        }
        self.state.check_unique(id, record)?;
        self.state.rows.insert(id, record.clone());
        Ok(())
    }

    fn delete_family(&mut self, name: &str) -> Result<usize> {
        let before = self.state.rows.len();
        let repo = self.repo;
        self.state
            .rows
            .retain(|_, r| !(r.name == name && r.repo == repo));
        Ok(before - self.state.rows.len())
    }

    fn delete_arch(&mut self, name: &str, arch: &str) -> Result<usize> {
        let before = self.state.rows.len();
        let repo = self.repo;
        self.state
            .rows
            .retain(|_, r| !(r.name == name && r.arch == arch && r.repo == repo));
        Ok(before - self.state.rows.len())
    }

    fn record_sync_status(&mut self, digest: &str, package_count: usize) -> Result<()> {
        self.state.sync.insert(
            self.repo.to_string(),
            SyncStatus {
                repo: self.repo.to_string(),
                snapshot_digest: digest.to_string(),
                package_count,
                synced_at: Utc::now(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{record, seed};

    #[test]
    fn test_lookup_orders_by_arch() {
        let store = MemoryCatalog::new();
        seed(
            &store,
            &[
                record("foo", "x86_64", "1.0-1", "demo"),
                record("foo", "aarch64", "1.0-1", "demo"),
                record("foo", "any", "1.0-1", "alpha"),
            ],
        );

        assert_eq!(store.lookup("foo", "demo").unwrap().unwrap().arch, "aarch64");
        assert_eq!(
            store.lookup_arch("foo", "x86_64", "demo").unwrap().unwrap().arch,
            "x86_64"
        );
        assert_eq!(store.family("foo", "demo").unwrap().len(), 2);
        assert_eq!(store.lookup_any("foo").unwrap().unwrap().repo, "alpha");
        assert!(store.lookup("foo", "nowhere").unwrap().is_none());
    }

    #[test]
    fn test_failed_transaction_leaves_state_untouched() {
        let store = MemoryCatalog::new();
        seed(&store, &[record("foo", "x86_64", "1.0-1", "demo")]);

        let result: Result<()> = store.transaction("demo", |writer| {
            writer.delete_family("foo")?;
            writer.insert_batch(&[record("bar", "any", "1.0-1", "demo")])?;
            Err(SyncError::PoisonError)
        });
        assert!(result.is_err());

        assert!(store.lookup("foo", "demo").unwrap().is_some());
        assert!(store.lookup("bar", "demo").unwrap().is_none());
    }

    #[test]
    fn test_unique_filename_is_enforced() {
        let store = MemoryCatalog::new();
        let foo = record("foo", "x86_64", "1.0-1", "demo");
        seed(&store, &[foo.clone()]);

        let mut clash = record("foo", "x86_64", "1.0-1", "other");
        clash.filename = foo.filename.clone();
        let result = store.transaction("other", |writer| writer.insert_batch(&[clash]));
        assert!(matches!(
            result,
            Err(SyncError::Db(DbError::ConstraintViolation(_)))
        ));
    }

    #[test]
    fn test_writer_rejects_other_repo() {
        let store = MemoryCatalog::new();
        let result = store.transaction("demo", |writer| {
            writer.insert_batch(&[record("foo", "x86_64", "1.0-1", "extra")])
        });
        assert!(matches!(result, Err(SyncError::RepoMismatch { .. })));
    }

    #[test]
    fn test_writer_cannot_update_other_repo_row() {
        let store = MemoryCatalog::new();
        seed(&store, &[record("foo", "x86_64", "1.0-1", "extra")]);

        let id = store
            .transaction("extra", |writer| Ok(writer.family("foo")?["x86_64"].id))
            .unwrap();
        let result = store.transaction("demo", |writer| {
            writer.update(id, &record("foo", "x86_64", "1.1-1", "demo"))
        });
        assert!(matches!(result, Err(SyncError::Db(DbError::NotFound(_)))));
    }

    #[test]
    fn test_sync_status_is_recorded() {
        let store = MemoryCatalog::new();
        store
            .transaction("demo", |writer| writer.record_sync_status("abcd", 4))
            .unwrap();

        let status = store.sync_status("demo").unwrap().unwrap();
        assert_eq!(status.snapshot_digest, "abcd");
        assert_eq!(status.package_count, 4);
        assert_eq!(store.sync_statuses().unwrap().len(), 1);
    }
}
