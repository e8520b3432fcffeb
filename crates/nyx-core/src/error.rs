//! Error types for nyx-core.

use miette::Diagnostic;
use nyx_config::error::ConfigError;
use nyx_db::DbError;
use nyx_registry::RegistryError;
use nyx_utils::error::LockError;
use thiserror::Error;

/// Error returned by a sync run or a catalog query.
///
/// A failed sync run never leaves partial writes behind: the catalog is
/// exactly as it was before the run.
#[derive(Error, Diagnostic, Debug)]
pub enum SyncError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to parse {path}: {source}")]
    #[diagnostic(
        code(nyx::parse),
        help("Set `on_parse_error = \"skip\"` to ignore broken entries")
    )]
    Parse {
        path: String,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Lock(#[from] LockError),

    #[error("Record {name} ({arch}) belongs to repository '{found}', not '{expected}'")]
    #[diagnostic(
        code(nyx::repo_mismatch),
        help("A sync run may only write records of the repository it was started for")
    )]
    RepoMismatch {
        name: String,
        arch: String,
        expected: String,
        found: String,
    },

    #[error("Invalid repository tag '{0}'")]
    #[diagnostic(code(nyx::invalid_repo))]
    InvalidRepo(String),

    #[error("Error while {action}")]
    #[diagnostic(code(nyx::io), help("Check file permissions and disk space"))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Thread lock poison error")]
    #[diagnostic(
        code(nyx::poison),
        help("This is an internal error, please report it")
    )]
    PoisonError,
}

impl From<diesel::result::Error> for SyncError {
    fn from(err: diesel::result::Error) -> Self {
        SyncError::Db(DbError::from(err))
    }
}

impl From<diesel::result::ConnectionError> for SyncError {
    fn from(err: diesel::result::ConnectionError) -> Self {
        SyncError::Db(DbError::from(err))
    }
}

impl SyncError {
    /// Whether the failure came from a single unparsable metadata block.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diesel_errors_map_to_db() {
        let err = SyncError::from(diesel::result::Error::NotFound);
        assert!(matches!(err, SyncError::Db(DbError::NotFound(_))));
    }

    #[test]
    fn test_parse_error_display() {
        let err = SyncError::Parse {
            path: "foo-1.0-1/desc".into(),
            source: RegistryError::MissingField("NAME"),
        };
        assert!(err.is_parse_error());
        assert_eq!(
            err.to_string(),
            "Failed to parse foo-1.0-1/desc: Missing required field NAME"
        );
    }

    #[test]
    fn test_repo_mismatch_display() {
        let err = SyncError::RepoMismatch {
            name: "foo".into(),
            arch: "x86_64".into(),
            expected: "demo".into(),
            found: "extra".into(),
        };
        assert_eq!(
            err.to_string(),
            "Record foo (x86_64) belongs to repository 'extra', not 'demo'"
        );
    }
}
