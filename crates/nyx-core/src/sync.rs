//! Parse-and-reconcile runs against a catalog store.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use nyx_config::config::{Config, ParseErrorPolicy, DEFAULT_INSERT_CHUNK_SIZE};
use nyx_events::{EventSinkHandle, NullSink, SyncEvent, SyncStage};
use nyx_registry::{read_desc_blocks, DescBlock, ErrorContext, PackageRecord};
use nyx_utils::lock::FileLock;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    error::{Result, SyncError},
    plan::{SyncPlan, SyncReport},
    snapshot::Snapshot,
    store::{CatalogStore, SyncStatus},
};

/// Tuning and policy knobs of a [`Synchronizer`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Records per insert statement.
    pub insert_chunk_size: usize,
    pub on_parse_error: ParseErrorPolicy,
    /// Directory of the per-repository lock files. `None` disables
    /// cross-process locking.
    pub lock_dir: Option<PathBuf>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            insert_chunk_size: DEFAULT_INSERT_CHUNK_SIZE,
            on_parse_error: ParseErrorPolicy::default(),
            lock_dir: None,
        }
    }
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            insert_chunk_size: config.insert_chunk_size(),
            on_parse_error: config.parse_error_policy(),
            lock_dir: Some(config.get_lock_dir()?),
        })
    }
}

/// BLAKE3 hex digest identifying a snapshot blob.
pub fn snapshot_digest(blob: &[u8]) -> String {
    blake3::hash(blob).to_hex().to_string()
}

fn validate_repo(repo: &str) -> Result<()> {
    let valid = !repo.is_empty()
        && repo
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && repo != "."
        && repo != "..";

    if valid {
        Ok(())
    } else {
        Err(SyncError::InvalidRepo(repo.to_string()))
    }
}

/// Brings the catalog of a repository tag in line with its newest snapshot.
///
/// Runs for the same tag are serialised through a file lock in
/// [`SyncOptions::lock_dir`]; runs for different tags only contend on the
/// store's own write lock.
pub struct Synchronizer<S> {
    store: S,
    options: SyncOptions,
    events: EventSinkHandle,
}

impl<S: CatalogStore> Synchronizer<S> {
    pub fn new(store: S, options: SyncOptions) -> Self {
        Self {
            store,
            options,
            events: Arc::new(NullSink),
        }
    }

    pub fn with_events(mut self, events: EventSinkHandle) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Parses the snapshot `blob` and reconciles the `repo` catalog with it
    /// in one transaction.
    ///
    /// On error the catalog is left exactly as it was.
    pub fn synchronize(&self, repo: &str, blob: &[u8]) -> Result<SyncReport> {
        let result = validate_repo(repo)
            .and_then(|_| self.locked(repo, || self.synchronize_blob(repo, blob)));
        self.finish(repo, result)
    }

    /// Reads the snapshot at `path` and synchronizes `repo` with it.
    pub fn synchronize_file(&self, repo: &str, path: &Path) -> Result<SyncReport> {
        let blob =
            fs::read(path).with_context(|| format!("reading snapshot {}", path.display()))?;
        self.synchronize(repo, &blob)
    }

    /// Reconciles `repo` with already parsed records.
    ///
    /// The sync status of the tag is not touched since there is no
    /// snapshot blob to identify.
    pub fn reconcile(&self, repo: &str, records: Vec<PackageRecord>) -> Result<SyncReport> {
        let result = validate_repo(repo).and_then(|_| {
            self.locked(repo, || {
                let snapshot = Snapshot::from_records(repo, records)?;
                self.apply(&snapshot, None)
            })
        });
        self.finish(repo, result)
    }

    /// Whether `blob` is the snapshot last applied to `repo`.
    pub fn is_current(&self, repo: &str, blob: &[u8]) -> Result<bool> {
        let digest = snapshot_digest(blob);
        Ok(self
            .store
            .sync_status(repo)?
            .is_some_and(|status| status.snapshot_digest == digest))
    }

    pub fn lookup(&self, name: &str, repo: &str) -> Result<Option<PackageRecord>> {
        self.store.lookup(name, repo)
    }

    pub fn lookup_arch(&self, name: &str, arch: &str, repo: &str) -> Result<Option<PackageRecord>> {
        self.store.lookup_arch(name, arch, repo)
    }

    pub fn family(&self, name: &str, repo: &str) -> Result<Vec<PackageRecord>> {
        self.store.family(name, repo)
    }

    pub fn lookup_any(&self, name: &str) -> Result<Option<PackageRecord>> {
        self.store.lookup_any(name)
    }

    pub fn status(&self, repo: &str) -> Result<Option<SyncStatus>> {
        self.store.sync_status(repo)
    }

    fn emit(&self, repo: &str, stage: SyncStage) {
        self.events.emit(SyncEvent::Progress {
            repo: repo.to_string(),
            stage,
        });
    }

    fn locked<T>(&self, repo: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _lock = match &self.options.lock_dir {
            Some(dir) => {
                let lock = FileLock::acquire(dir, &format!("sync-{repo}"))?;
                debug!(repo, path = %lock.path().display(), "acquired sync lock");
                Some(lock)
            }
            None => None,
        };
        f()
    }

    fn synchronize_blob(&self, repo: &str, blob: &[u8]) -> Result<SyncReport> {
        self.emit(repo, SyncStage::Reading);
        let blocks = read_desc_blocks(blob)?;

        self.emit(repo, SyncStage::Parsing {
            blocks: blocks.len(),
        });
        let (records, skipped) = self.parse_blocks(repo, &blocks)?;
        let snapshot = Snapshot::from_records(repo, records)?;

        let digest = snapshot_digest(blob);
        let mut report = self.apply(&snapshot, Some(&digest))?;
        report.skipped = skipped;
        Ok(report)
    }

    /// Parses `blocks` in parallel, applying the parse error policy in
    /// archive order.
    fn parse_blocks(
        &self,
        repo: &str,
        blocks: &[DescBlock],
    ) -> Result<(Vec<PackageRecord>, usize)> {
        let parsed: Vec<_> = blocks.par_iter().map(|block| block.parse(repo)).collect();

        let mut records = Vec::with_capacity(parsed.len());
        let mut skipped = 0;
        for (block, result) in blocks.iter().zip(parsed) {
            match (result, self.options.on_parse_error) {
                (Ok(record), _) => records.push(record),
                (Err(err), ParseErrorPolicy::Skip) if err.is_record_error() => {
                    warn!(repo, path = %block.path, "skipping package entry: {err}");
                    skipped += 1;
                }
                (Err(source), _) => {
                    return Err(SyncError::Parse {
                        path: block.path.clone(),
                        source,
                    });
                }
            }
        }

        Ok((records, skipped))
    }

    fn apply(&self, snapshot: &Snapshot, digest: Option<&str>) -> Result<SyncReport> {
        let repo = snapshot.repo();
        self.emit(repo, SyncStage::Reconciling {
            records: snapshot.len(),
        });

        let chunk_size = self.options.insert_chunk_size;
        self.store.transaction(repo, |writer| {
            let report = SyncPlan::compute(snapshot, writer)?.apply(writer, chunk_size)?;
            if let Some(digest) = digest {
                writer.record_sync_status(digest, snapshot.len())?;
            }
            Ok(report)
        })
    }

    fn finish(&self, repo: &str, result: Result<SyncReport>) -> Result<SyncReport> {
        match &result {
            Ok(report) => {
                info!(
                    repo,
                    inserted = report.inserted,
                    updated = report.updated,
                    deleted = report.deleted,
                    skipped = report.skipped,
                    unchanged = report.unchanged,
                    "repository synchronized"
                );
                self.emit(repo, SyncStage::Complete(report.summary()));
            }
            Err(err) => {
                warn!(repo, "sync failed, catalog unchanged: {err}");
                self.events.emit(SyncEvent::Failed {
                    repo: repo.to_string(),
                    message: err.to_string(),
                });
            }
        }
        result
    }
}
