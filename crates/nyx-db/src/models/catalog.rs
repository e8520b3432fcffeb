use chrono::DateTime;
use diesel::prelude::*;
use nyx_registry::PackageRecord;

use crate::schema::catalog::*;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Package {
    pub id: i32,
    pub filename: String,
    pub name: String,
    pub base: Option<String>,
    pub version: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub arch: String,
    pub packager: String,
    pub build_date: i64,
    pub repo: String,
}

impl From<Package> for PackageRecord {
    fn from(package: Package) -> Self {
        PackageRecord {
            filename: package.filename,
            name: package.name,
            base: package.base,
            version: package.version,
            description: package.description,
            url: package.url,
            arch: package.arch,
            packager: package.packager,
            build_date: DateTime::from_timestamp(package.build_date, 0).unwrap_or_default(),
            repo: package.repo,
        }
    }
}

/// Row values of a package, used both for inserts and for full-row updates.
///
/// `None` is written as NULL in both cases, so clearing an optional field
/// in the snapshot clears it in the catalog.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = packages)]
#[diesel(treat_none_as_default_value = false)]
#[diesel(treat_none_as_null = true)]
pub struct NewPackage<'a> {
    pub filename: &'a str,
    pub name: &'a str,
    pub base: Option<&'a str>,
    pub version: &'a str,
    pub description: Option<&'a str>,
    pub url: Option<&'a str>,
    pub arch: &'a str,
    pub packager: &'a str,
    pub build_date: i64,
    pub repo: &'a str,
}

impl<'a> From<&'a PackageRecord> for NewPackage<'a> {
    fn from(record: &'a PackageRecord) -> Self {
        NewPackage {
            filename: &record.filename,
            name: &record.name,
            base: record.base.as_deref(),
            version: &record.version,
            description: record.description.as_deref(),
            url: record.url.as_deref(),
            arch: &record.arch,
            packager: &record.packager,
            build_date: record.build_date.timestamp(),
            repo: &record.repo,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sync_state)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncState {
    pub repo: String,
    pub snapshot_digest: String,
    pub package_count: i64,
    pub synced_at: i64,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = sync_state)]
pub struct NewSyncState<'a> {
    pub repo: &'a str,
    pub snapshot_digest: &'a str,
    pub package_count: i64,
    pub synced_at: i64,
}
