use chrono::{DateTime, Utc};
use serde::Serialize;

/// One build of one package for one architecture, as listed in a
/// repository snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    /// Package file name; unique across the whole catalog.
    pub filename: String,
    pub name: String,
    /// `pkgbase` for split packages.
    pub base: Option<String>,
    pub version: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub arch: String,
    pub packager: String,
    pub build_date: DateTime<Utc>,
    /// Repository tag the record was ingested under.
    pub repo: String,
}

impl PackageRecord {
    /// Whether `other` describes the same (name, arch, repo) slot.
    pub fn same_slot(&self, other: &PackageRecord) -> bool {
        self.name == other.name && self.arch == other.arch && self.repo == other.repo
    }
}
