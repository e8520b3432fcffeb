//! SQLite storage for the nyx package catalog.
//!
//! The catalog holds one row per (name, arch, repo) slot in `packages`
//! and the last applied snapshot per repository tag in `sync_state`.
//! Queries go through the repository structs in [`repository`], which take
//! a `&mut SqliteConnection` so callers can compose them inside a single
//! transaction.

pub mod connection;
pub mod error;
pub mod migration;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::DbConnection;
pub use error::{DbError, Result};
