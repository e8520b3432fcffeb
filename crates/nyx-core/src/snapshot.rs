//! Incoming records of one repository tag, grouped by family.

use std::collections::{btree_map, BTreeMap};

use nyx_registry::PackageRecord;
use tracing::warn;

use crate::{error::Result, store::ensure_repo};

/// The complete set of records a snapshot declares for one repository tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    repo: String,
    families: BTreeMap<String, BTreeMap<String, PackageRecord>>,
}

impl Snapshot {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            families: BTreeMap::new(),
        }
    }

    /// Groups `records` by name and arch.
    ///
    /// A later record for an already seen (name, arch) pair replaces the
    /// earlier one.
    ///
    /// # Errors
    ///
    /// [`crate::SyncError::RepoMismatch`] if a record carries another tag.
    pub fn from_records<I>(repo: impl Into<String>, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = PackageRecord>,
    {
        let mut snapshot = Self::new(repo);
        for record in records {
            snapshot.insert(record)?;
        }
        Ok(snapshot)
    }

    /// Adds `record`, returning the record it displaced, if any.
    pub fn insert(&mut self, record: PackageRecord) -> Result<Option<PackageRecord>> {
        ensure_repo(&self.repo, &record)?;

        let family = self.families.entry(record.name.clone()).or_default();
        let replaced = family.insert(record.arch.clone(), record);
        if let Some(old) = &replaced {
            warn!(
                repo = %self.repo,
                name = %old.name,
                arch = %old.arch,
                "duplicate package entry in snapshot, keeping the last one"
            );
        }
        Ok(replaced)
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn contains(&self, name: &str) -> bool {
        self.families.contains_key(name)
    }

    pub fn family(&self, name: &str) -> Option<&BTreeMap<String, PackageRecord>> {
        self.families.get(name)
    }

    pub fn families(&self) -> btree_map::Iter<'_, String, BTreeMap<String, PackageRecord>> {
        self.families.iter()
    }

    pub fn family_count(&self) -> usize {
        self.families.len()
    }

    /// Number of records across all families.
    pub fn len(&self) -> usize {
        self.families.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}
