/// Events emitted while synchronizing a repository snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Progress { repo: String, stage: SyncStage },
    /// The run was rolled back; the catalog is unchanged.
    Failed { repo: String, message: String },
}

impl SyncEvent {
    pub fn repo(&self) -> &str {
        match self {
            Self::Progress { repo, .. } | Self::Failed { repo, .. } => repo,
        }
    }
}

/// Stages of a single sync run, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStage {
    /// Reading metadata blocks out of the snapshot archive.
    Reading,
    /// Parsing the extracted blocks into records.
    Parsing { blocks: usize },
    /// Diffing against the catalog and applying the changes.
    Reconciling { records: usize },
    /// Transaction committed.
    Complete(SyncSummary),
}

/// Change counts of a committed sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    pub unchanged: usize,
}

impl SyncSummary {
    pub fn changes(&self) -> usize {
        self.inserted + self.updated + self.deleted
    }

    pub fn is_noop(&self) -> bool {
        self.changes() == 0
    }
}
