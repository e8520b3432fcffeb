//! Catalog store backed by the nyx-db SQLite schema.

use std::{
    fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use chrono::DateTime;
use diesel::{QueryResult, SqliteConnection};
use nyx_db::{
    models::catalog::{NewPackage, NewSyncState, SyncState},
    repository::{CatalogRepository, SyncStateRepository},
    DbConnection, DbError,
};
use nyx_registry::PackageRecord;
use tracing::debug;

use crate::{
    error::{Result, SyncError},
    store::{ensure_repo, CatalogStore, CatalogWriter, Family, RecordId, StoredRecord, SyncStatus},
};

/// SQLite catalog with one writer connection and, for on-disk databases,
/// a separate reader connection.
///
/// With WAL enabled the reader keeps seeing the last committed state while
/// a sync transaction is open on the writer, so lookups never observe a
/// half-applied run and are not blocked by it.
pub struct SqliteCatalog {
    writer: Mutex<DbConnection>,
    reader: Option<Mutex<DbConnection>>,
}

impl SqliteCatalog {
    /// Opens (creating if needed) the catalog database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                SyncError::IoError {
                    action: format!("creating catalog directory {}", parent.display()),
                    source,
                }
            })?;
        }

        let writer = DbConnection::open(path)?;
        let reader = DbConnection::open(path)?;
        debug!(path = %path.display(), "opened catalog database");

        Ok(Self {
            writer: Mutex::new(writer),
            reader: Some(Mutex::new(reader)),
        })
    }

    /// Opens a private in-memory catalog; reads share the writer connection.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            writer: Mutex::new(DbConnection::open_in_memory()?),
            reader: None,
        })
    }

    fn reader(&self) -> Result<MutexGuard<'_, DbConnection>> {
        self.reader
            .as_ref()
            .unwrap_or(&self.writer)
            .lock()
            .map_err(|_| SyncError::PoisonError)
    }

    /// Executes a read-only query on the reader connection.
    fn with_reader<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<T>,
    {
        let mut conn = self.reader()?;
        Ok(f(conn.conn())?)
    }
}

fn to_status(state: SyncState) -> SyncStatus {
    SyncStatus {
        repo: state.repo,
        snapshot_digest: state.snapshot_digest,
        package_count: usize::try_from(state.package_count).unwrap_or_default(),
        synced_at: DateTime::from_timestamp(state.synced_at, 0).unwrap_or_default(),
    }
}

impl CatalogStore for SqliteCatalog {
    fn lookup(&self, name: &str, repo: &str) -> Result<Option<PackageRecord>> {
        let package = self.with_reader(|conn| CatalogRepository::find_first(conn, name, repo))?;
        Ok(package.map(PackageRecord::from))
    }

    fn lookup_arch(&self, name: &str, arch: &str, repo: &str) -> Result<Option<PackageRecord>> {
        let package =
            self.with_reader(|conn| CatalogRepository::find_by_slot(conn, name, arch, repo))?;
        Ok(package.map(PackageRecord::from))
    }

    fn family(&self, name: &str, repo: &str) -> Result<Vec<PackageRecord>> {
        let packages = self.with_reader(|conn| CatalogRepository::find_family(conn, name, repo))?;
        Ok(packages.into_iter().map(PackageRecord::from).collect())
    }

    fn lookup_any(&self, name: &str) -> Result<Option<PackageRecord>> {
        let package = self.with_reader(|conn| CatalogRepository::find_any(conn, name))?;
        Ok(package.map(PackageRecord::from))
    }

    fn count(&self, repo: &str) -> Result<usize> {
        let count = self.with_reader(|conn| CatalogRepository::count_by_repo(conn, repo))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn sync_status(&self, repo: &str) -> Result<Option<SyncStatus>> {
        let state = self.with_reader(|conn| SyncStateRepository::get(conn, repo))?;
        Ok(state.map(to_status))
    }

    fn sync_statuses(&self) -> Result<Vec<SyncStatus>> {
        let states = self.with_reader(SyncStateRepository::list_all)?;
        Ok(states.into_iter().map(to_status).collect())
    }

    fn transaction<T, F>(&self, repo: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn CatalogWriter) -> Result<T>,
    {
        let mut conn = self.writer.lock().map_err(|_| SyncError::PoisonError)?;
        conn.conn().immediate_transaction(|conn| {
            f(&mut SqliteWriter {
                conn,
                repo,
            })
        })
    }
}

struct SqliteWriter<'a> {
    conn: &'a mut SqliteConnection,
    repo: &'a str,
}

impl CatalogWriter for SqliteWriter<'_> {
    fn repo(&self) -> &str {
        self.repo
    }

    fn family_names(&mut self) -> Result<Vec<String>> {
        Ok(CatalogRepository::family_names(self.conn, self.repo)?)
    }

    fn family(&mut self, name: &str) -> Result<Family> {
        let packages = CatalogRepository::find_family(self.conn, name, self.repo)?;
        Ok(packages
            .into_iter()
            .map(|package| {
                let id = package.id;
                let record = PackageRecord::from(package);
                (record.arch.clone(), StoredRecord { id, record })
            })
            .collect())
    }

    fn insert_batch(&mut self, records: &[PackageRecord]) -> Result<usize> {
        let rows = records
            .iter()
            .map(|record| {
                ensure_repo(self.repo, record)?;
                Ok(NewPackage::from(record))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CatalogRepository::insert_batch(self.conn, &rows)?)
    }

    fn update(&mut self, id: RecordId, record: &PackageRecord) -> Result<()> {
        ensure_repo(self.repo, record)?;
        let row = NewPackage::from(record);
        let updated = CatalogRepository::update_by_id(self.conn, id, self.repo, &row)?;
        if updated == 0 {
            return Err(DbError::NotFound(format!("package #{id}")).into());
        }
        Ok(())
    }

    fn delete_family(&mut self, name: &str) -> Result<usize> {
        Ok(CatalogRepository::delete_family(self.conn, name, self.repo)?)
    }

    fn delete_arch(&mut self, name: &str, arch: &str) -> Result<usize> {
        Ok(CatalogRepository::delete_slot(
            self.conn, name, arch, self.repo,
        )?)
    }

    fn record_sync_status(&mut self, digest: &str, package_count: usize) -> Result<()> {
        SyncStateRepository::upsert(
            self.conn,
            &NewSyncState {
                repo: self.repo,
                snapshot_digest: digest,
                package_count: i64::try_from(package_count).unwrap_or(i64::MAX),
                synced_at: chrono::Utc::now().timestamp(),
            },
        )?;
        Ok(())
    }
}
