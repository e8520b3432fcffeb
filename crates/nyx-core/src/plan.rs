//! Diffing a snapshot against the catalog and applying the result.

use std::collections::HashSet;

use nyx_events::SyncSummary;
use nyx_registry::PackageRecord;
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    error::Result,
    snapshot::Snapshot,
    store::{CatalogWriter, RecordId},
};

/// Changes needed to make one repository tag match a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub repo: String,
    /// Families stored under the tag but absent from the snapshot.
    pub delete_families: Vec<String>,
    /// (name, arch) slots whose family survives but whose arch is gone.
    pub delete_arches: Vec<(String, String)>,
    /// Existing slots whose stored fields differ from the snapshot.
    pub updates: Vec<(RecordId, PackageRecord)>,
    /// New families and new arches of existing families, one record each.
    pub inserts: Vec<PackageRecord>,
    /// Existing slots already equal to the snapshot.
    pub unchanged: usize,
}

/// Outcome of a committed sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub repo: String,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Metadata blocks dropped by the skip parse policy.
    pub skipped: usize,
    pub unchanged: usize,
}

impl SyncReport {
    pub fn summary(&self) -> SyncSummary {
        SyncSummary {
            inserted: self.inserted,
            updated: self.updated,
            deleted: self.deleted,
            skipped: self.skipped,
            unchanged: self.unchanged,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.summary().is_noop()
    }
}

impl SyncPlan {
    /// Computes the plan for `snapshot` against the current state seen
    /// through `writer`.
    pub fn compute(snapshot: &Snapshot, writer: &mut dyn CatalogWriter) -> Result<Self> {
        let mut plan = SyncPlan {
            repo: snapshot.repo().to_string(),
            ..Default::default()
        };

        for name in writer.family_names()? {
            if !snapshot.contains(&name) {
                trace!(name, "family gone from snapshot");
                plan.delete_families.push(name);
            }
        }

        for (name, incoming) in snapshot.families() {
            let existing = writer.family(name)?;
            if existing.is_empty() {
                plan.inserts.extend(incoming.values().cloned());
                continue;
            }

            let mut matched = HashSet::new();
            for (arch, stored) in existing {
                match incoming.get(&arch) {
                    Some(record) if *record == stored.record => plan.unchanged += 1,
                    Some(record) => plan.updates.push((stored.id, record.clone())),
                    None => {
                        trace!(name, arch, "arch gone from snapshot");
                        plan.delete_arches.push((name.clone(), arch.clone()));
                    }
                }
                matched.insert(arch);
            }

            for (arch, record) in incoming {
                if !matched.contains(arch) {
                    trace!(name, arch, "new arch for existing family");
                    plan.inserts.push(record.clone());
                }
            }
        }

        debug!(
            repo = %plan.repo,
            delete_families = plan.delete_families.len(),
            delete_arches = plan.delete_arches.len(),
            updates = plan.updates.len(),
            inserts = plan.inserts.len(),
            unchanged = plan.unchanged,
            "computed sync plan"
        );
        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.delete_families.is_empty()
            && self.delete_arches.is_empty()
            && self.updates.is_empty()
            && self.inserts.is_empty()
    }

    /// Applies deletions, then updates, then inserts in chunks of
    /// `chunk_size` records.
    pub fn apply(self, writer: &mut dyn CatalogWriter, chunk_size: usize) -> Result<SyncReport> {
        let mut report = SyncReport {
            repo: self.repo,
            unchanged: self.unchanged,
            ..Default::default()
        };

        for name in &self.delete_families {
            report.deleted += writer.delete_family(name)?;
        }
        for (name, arch) in &self.delete_arches {
            report.deleted += writer.delete_arch(name, arch)?;
        }

        for (id, record) in &self.updates {
            writer.update(*id, record)?;
            report.updated += 1;
        }

        for chunk in self.inserts.chunks(chunk_size.max(1)) {
            report.inserted += writer.insert_batch(chunk)?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        memory::MemoryCatalog,
        store::CatalogStore,
        test_utils::{record, seed},
    };

    fn plan_for(store: &MemoryCatalog, snapshot: &Snapshot) -> SyncPlan {
        store
            .transaction(snapshot.repo(), |writer| SyncPlan::compute(snapshot, writer))
            .unwrap()
    }

    #[test]
    fn test_empty_catalog_inserts_everything() {
        let store = MemoryCatalog::new();
        let snapshot = Snapshot::from_records(
            "demo",
            [
                record("foo", "x86_64", "1.0-1", "demo"),
                record("foo", "i686", "1.0-1", "demo"),
            ],
        )
        .unwrap();

        let plan = plan_for(&store, &snapshot);
        assert_eq!(plan.inserts.len(), 2);
        assert!(plan.updates.is_empty());
        assert!(plan.delete_families.is_empty());
    }

    #[test]
    fn test_arch_gain_inserts_individual_records() {
        let store = MemoryCatalog::new();
        seed(&store, &[record("foo", "x86_64", "1.0-1", "demo")]);

        let snapshot = Snapshot::from_records(
            "demo",
            [
                record("foo", "x86_64", "1.1-1", "demo"),
                record("foo", "i686", "1.1-1", "demo"),
            ],
        )
        .unwrap();

        let plan = plan_for(&store, &snapshot);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].1.arch, "x86_64");
        assert_eq!(plan.inserts, vec![record("foo", "i686", "1.1-1", "demo")]);
        assert!(plan.delete_arches.is_empty());
    }

    #[test]
    fn test_arch_loss_and_family_loss() {
        let store = MemoryCatalog::new();
        seed(
            &store,
            &[
                record("foo", "x86_64", "1.0-1", "demo"),
                record("foo", "i686", "1.0-1", "demo"),
                record("bar", "any", "1.0-1", "demo"),
            ],
        );

        let snapshot =
            Snapshot::from_records("demo", [record("foo", "i686", "1.0-1", "demo")]).unwrap();

        let plan = plan_for(&store, &snapshot);
        assert_eq!(plan.delete_families, ["bar"]);
        assert_eq!(
            plan.delete_arches,
            [("foo".to_string(), "x86_64".to_string())]
        );
        assert_eq!(plan.unchanged, 1);
        assert!(plan.updates.is_empty() && plan.inserts.is_empty());
    }

    #[test]
    fn test_identical_snapshot_is_empty_plan() {
        let store = MemoryCatalog::new();
        let records = [
            record("foo", "x86_64", "1.0-1", "demo"),
            record("bar", "any", "2.0-1", "demo"),
        ];
        seed(&store, &records);

        let snapshot = Snapshot::from_records("demo", records).unwrap();
        let plan = plan_for(&store, &snapshot);
        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, 2);
    }

    #[test]
    fn test_apply_counts_and_chunks() {
        let store = MemoryCatalog::new();
        seed(&store, &[record("old", "any", "1.0-1", "demo")]);

        let records: Vec<_> = (0..7)
            .map(|i| record(&format!("pkg{i}"), "x86_64", "1.0-1", "demo"))
            .collect();
        let snapshot = Snapshot::from_records("demo", records).unwrap();

        let report = store
            .transaction("demo", |writer| {
                SyncPlan::compute(&snapshot, writer)?.apply(writer, 3)
            })
            .unwrap();
        assert_eq!(report.inserted, 7);
        assert_eq!(report.deleted, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(store.count("demo").unwrap(), 7);
    }

    #[test]
    fn test_report_summary() {
        let report = SyncReport {
            repo: "demo".into(),
            inserted: 1,
            updated: 2,
            deleted: 3,
            skipped: 4,
            unchanged: 5,
        };
        assert_eq!(report.summary().changes(), 6);
        assert!(!report.is_noop());
        assert!(SyncReport::default().is_noop());
    }
}
