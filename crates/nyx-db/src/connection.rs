//! Catalog database connection.

use std::path::Path;

use diesel::{sql_query, Connection, ConnectionError, RunQueryDsl, SqliteConnection};

use crate::migration::apply_migrations;

/// Milliseconds a writer waits on a locked database before giving up.
pub const BUSY_TIMEOUT_MS: u32 = 10_000;

/// Database connection wrapper with migration support.
pub struct DbConnection {
    conn: SqliteConnection,
}

impl DbConnection {
    /// Opens the catalog at `path`, enables WAL and runs pending migrations.
    ///
    /// In WAL mode readers keep seeing the last committed state while a
    /// sync transaction is open; concurrent writers wait up to
    /// [`BUSY_TIMEOUT_MS`] for the write lock.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConnectionError> {
        let path_str = path.as_ref().to_string_lossy();
        let mut conn = SqliteConnection::establish(&path_str)?;

        sql_query("PRAGMA journal_mode = WAL;")
            .execute(&mut conn)
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        Self::prepare(conn)
    }

    /// Opens a private in-memory catalog.
    pub fn open_in_memory() -> Result<Self, ConnectionError> {
        Self::prepare(SqliteConnection::establish(":memory:")?)
    }

    fn prepare(mut conn: SqliteConnection) -> Result<Self, ConnectionError> {
        sql_query(format!("PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};"))
            .execute(&mut conn)
            .map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        apply_migrations(&mut conn).map_err(|e| ConnectionError::BadConnection(e.to_string()))?;

        Ok(Self { conn })
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl std::ops::Deref for DbConnection {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl std::ops::DerefMut for DbConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
