//! Per-repository sync bookkeeping.

use diesel::prelude::*;

use crate::{
    models::catalog::{NewSyncState, SyncState},
    schema::catalog::sync_state,
};

pub struct SyncStateRepository;

impl SyncStateRepository {
    pub fn get(conn: &mut SqliteConnection, repo: &str) -> QueryResult<Option<SyncState>> {
        sync_state::table
            .filter(sync_state::repo.eq(repo))
            .select(SyncState::as_select())
            .first(conn)
            .optional()
    }

    pub fn list_all(conn: &mut SqliteConnection) -> QueryResult<Vec<SyncState>> {
        sync_state::table
            .order(sync_state::repo.asc())
            .select(SyncState::as_select())
            .load(conn)
    }

    /// Inserts or replaces the sync state of `state.repo`.
    pub fn upsert(conn: &mut SqliteConnection, state: &NewSyncState) -> QueryResult<usize> {
        diesel::insert_into(sync_state::table)
            .values(state)
            .on_conflict(sync_state::repo)
            .do_update()
            .set(state)
            .execute(conn)
    }
}
