//! Package catalog queries.

use diesel::{dsl::count_star, prelude::*};

use crate::{
    models::catalog::{NewPackage, Package},
    schema::catalog::packages,
};

/// Bind variables SQLite accepts in one statement (`SQLITE_MAX_VARIABLE_NUMBER`).
const SQLITE_MAX_VARIABLES: usize = 32_766;

/// Columns bound per [`NewPackage`] row.
const PACKAGE_COLUMNS: usize = 10;

/// Largest number of rows a single INSERT can carry.
pub const MAX_ROWS_PER_INSERT: usize = SQLITE_MAX_VARIABLES / PACKAGE_COLUMNS;

/// Repository for package rows.
pub struct CatalogRepository;

impl CatalogRepository {
    /// Finds the record occupying the (name, arch, repo) slot.
    pub fn find_by_slot(
        conn: &mut SqliteConnection,
        name: &str,
        arch: &str,
        repo: &str,
    ) -> QueryResult<Option<Package>> {
        packages::table
            .filter(packages::name.eq(name))
            .filter(packages::arch.eq(arch))
            .filter(packages::repo.eq(repo))
            .select(Package::as_select())
            .first(conn)
            .optional()
    }

    /// Lists every arch record of a package family, ordered by arch.
    pub fn find_family(
        conn: &mut SqliteConnection,
        name: &str,
        repo: &str,
    ) -> QueryResult<Vec<Package>> {
        packages::table
            .filter(packages::name.eq(name))
            .filter(packages::repo.eq(repo))
            .order(packages::arch.asc())
            .select(Package::as_select())
            .load(conn)
    }

    /// First record of a family, by arch order.
    pub fn find_first(
        conn: &mut SqliteConnection,
        name: &str,
        repo: &str,
    ) -> QueryResult<Option<Package>> {
        packages::table
            .filter(packages::name.eq(name))
            .filter(packages::repo.eq(repo))
            .order(packages::arch.asc())
            .select(Package::as_select())
            .first(conn)
            .optional()
    }

    /// First record named `name` in any repository, ordered by repo then arch.
    pub fn find_any(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<Package>> {
        packages::table
            .filter(packages::name.eq(name))
            .order((packages::repo.asc(), packages::arch.asc()))
            .select(Package::as_select())
            .first(conn)
            .optional()
    }

    /// Distinct family names stored under `repo`.
    pub fn family_names(conn: &mut SqliteConnection, repo: &str) -> QueryResult<Vec<String>> {
        packages::table
            .filter(packages::repo.eq(repo))
            .select(packages::name)
            .distinct()
            .order(packages::name.asc())
            .load(conn)
    }

    pub fn count_by_repo(conn: &mut SqliteConnection, repo: &str) -> QueryResult<i64> {
        packages::table
            .filter(packages::repo.eq(repo))
            .select(count_star())
            .get_result(conn)
    }

    /// Inserts all `rows`, one statement per [`MAX_ROWS_PER_INSERT`] rows.
    pub fn insert_batch(conn: &mut SqliteConnection, rows: &[NewPackage]) -> QueryResult<usize> {
        let mut inserted = 0;
        for chunk in rows.chunks(MAX_ROWS_PER_INSERT) {
            inserted += diesel::insert_into(packages::table)
                .values(chunk)
                .execute(conn)?;
        }
        Ok(inserted)
    }

    /// Overwrites every column of the row with `id`, keeping the id.
    ///
    /// Rows of other repositories are left alone; the returned count is 0
    /// when `id` does not belong to `repo`.
    pub fn update_by_id(
        conn: &mut SqliteConnection,
        id: i32,
        repo: &str,
        row: &NewPackage,
    ) -> QueryResult<usize> {
        diesel::update(packages::table.find(id).filter(packages::repo.eq(repo)))
            .set(row)
            .execute(conn)
    }

    /// Deletes all arch records of a family.
    pub fn delete_family(
        conn: &mut SqliteConnection,
        name: &str,
        repo: &str,
    ) -> QueryResult<usize> {
        diesel::delete(
            packages::table
                .filter(packages::name.eq(name))
                .filter(packages::repo.eq(repo)),
        )
        .execute(conn)
    }

    /// Deletes the record in the (name, arch, repo) slot.
    pub fn delete_slot(
        conn: &mut SqliteConnection,
        name: &str,
        arch: &str,
        repo: &str,
    ) -> QueryResult<usize> {
        diesel::delete(
            packages::table
                .filter(packages::name.eq(name))
                .filter(packages::arch.eq(arch))
                .filter(packages::repo.eq(repo)),
        )
        .execute(conn)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use nyx_registry::PackageRecord;

    use super::*;
    use crate::{connection::DbConnection, error::DbError};

    fn record(name: &str, arch: &str, repo: &str) -> PackageRecord {
        PackageRecord {
            filename: format!("{name}-1.0-1-{arch}-{repo}.pkg.tar.zst"),
            name: name.into(),
            base: None,
            version: "1.0-1".into(),
            description: Some(format!("The {name} package")),
            url: None,
            arch: arch.into(),
            packager: "Nyx <nyx@example.org>".into(),
            build_date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            repo: repo.into(),
        }
    }

    fn seed(db: &mut DbConnection, records: &[PackageRecord]) {
        let rows: Vec<NewPackage> = records.iter().map(NewPackage::from).collect();
        assert_eq!(
            CatalogRepository::insert_batch(db.conn(), &rows).unwrap(),
            records.len()
        );
    }

    #[test]
    fn test_insert_and_find() {
        let mut db = DbConnection::open_in_memory().unwrap();
        let foo = record("foo", "x86_64", "demo");
        seed(&mut db, &[foo.clone()]);

        let found = CatalogRepository::find_by_slot(db.conn(), "foo", "x86_64", "demo")
            .unwrap()
            .unwrap();
        assert_eq!(PackageRecord::from(found), foo);
        assert!(
            CatalogRepository::find_by_slot(db.conn(), "foo", "i686", "demo")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_family_queries() {
        let mut db = DbConnection::open_in_memory().unwrap();
        seed(
            &mut db,
            &[
                record("foo", "x86_64", "demo"),
                record("foo", "aarch64", "demo"),
                record("bar", "any", "demo"),
                record("foo", "x86_64", "other"),
            ],
        );

        let family = CatalogRepository::find_family(db.conn(), "foo", "demo").unwrap();
        let arches: Vec<_> = family.iter().map(|p| p.arch.as_str()).collect();
        assert_eq!(arches, ["aarch64", "x86_64"]);

        let first = CatalogRepository::find_first(db.conn(), "foo", "demo")
            .unwrap()
            .unwrap();
        assert_eq!(first.arch, "aarch64");

        assert_eq!(
            CatalogRepository::family_names(db.conn(), "demo").unwrap(),
            ["bar", "foo"]
        );
        assert_eq!(CatalogRepository::count_by_repo(db.conn(), "demo").unwrap(), 3);

        let any = CatalogRepository::find_any(db.conn(), "foo").unwrap().unwrap();
        assert_eq!((any.repo.as_str(), any.arch.as_str()), ("demo", "aarch64"));
    }

    #[test]
    fn test_update_keeps_id_and_clears_optionals() {
        let mut db = DbConnection::open_in_memory().unwrap();
        seed(&mut db, &[record("foo", "x86_64", "demo")]);
        let before = CatalogRepository::find_first(db.conn(), "foo", "demo")
            .unwrap()
            .unwrap();

        let mut newer = record("foo", "x86_64", "demo");
        newer.version = "1.1-1".into();
        newer.filename = "foo-1.1-1-x86_64.pkg.tar.zst".into();
        newer.description = None;
        let row = NewPackage::from(&newer);
        assert_eq!(
            CatalogRepository::update_by_id(db.conn(), before.id, "other", &row).unwrap(),
            0
        );
        assert_eq!(
            CatalogRepository::update_by_id(db.conn(), before.id, "demo", &row).unwrap(),
            1
        );

        let after = CatalogRepository::find_first(db.conn(), "foo", "demo")
            .unwrap()
            .unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.version, "1.1-1");
        assert_eq!(after.description, None);
    }

    #[test]
    fn test_deletes_are_scoped() {
        let mut db = DbConnection::open_in_memory().unwrap();
        seed(
            &mut db,
            &[
                record("foo", "x86_64", "demo"),
                record("foo", "i686", "demo"),
                record("foo", "x86_64", "other"),
            ],
        );

        assert_eq!(
            CatalogRepository::delete_slot(db.conn(), "foo", "i686", "demo").unwrap(),
            1
        );
        assert_eq!(
            CatalogRepository::delete_family(db.conn(), "foo", "demo").unwrap(),
            1
        );
        assert_eq!(CatalogRepository::count_by_repo(db.conn(), "demo").unwrap(), 0);
        assert_eq!(CatalogRepository::count_by_repo(db.conn(), "other").unwrap(), 1);
    }

    #[test]
    fn test_duplicate_filename_is_constraint_violation() {
        let mut db = DbConnection::open_in_memory().unwrap();
        let foo = record("foo", "x86_64", "demo");
        seed(&mut db, &[foo.clone()]);

        let mut clash = record("foo", "i686", "demo");
        clash.filename = foo.filename.clone();
        let err = CatalogRepository::insert_batch(db.conn(), &[NewPackage::from(&clash)])
            .unwrap_err();
        assert!(matches!(
            DbError::from(err),
            DbError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn test_insert_batch_beyond_variable_limit() {
        let mut db = DbConnection::open_in_memory().unwrap();
        let records: Vec<_> = (0..MAX_ROWS_PER_INSERT + 224)
            .map(|i| record(&format!("pkg{i}"), "x86_64", "demo"))
            .collect();
        seed(&mut db, &records);

        assert_eq!(
            CatalogRepository::count_by_repo(db.conn(), "demo").unwrap() as usize,
            records.len()
        );
    }

    #[test]
    fn test_insert_empty_batch() {
        let mut db = DbConnection::open_in_memory().unwrap();
        assert_eq!(CatalogRepository::insert_batch(db.conn(), &[]).unwrap(), 0);
    }
}
