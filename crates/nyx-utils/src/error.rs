use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("Path is empty")]
    #[diagnostic(code(nyx_utils::path::empty))]
    Empty,

    #[error("Failed to get current directory: {source}")]
    #[diagnostic(code(nyx_utils::path::current_dir))]
    CurrentDir { source: std::io::Error },

    #[error("Environment variable `{var}` not set in `{input}`")]
    #[diagnostic(
        code(nyx_utils::path::missing_env_var),
        help("Export the variable or use an absolute path")
    )]
    MissingEnvVar { var: String, input: String },

    #[error("Unclosed variable expression starting at `{input}`")]
    #[diagnostic(code(nyx_utils::path::unclosed_variable))]
    UnclosedVariable { input: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum LockError {
    #[error("Failed to prepare lock directory `{}`: {source}", path.display())]
    #[diagnostic(
        code(nyx_utils::lock::directory),
        help("Check that the lock directory is writable")
    )]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open lock file `{}`: {source}", path.display())]
    #[diagnostic(code(nyx_utils::lock::open))]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to acquire lock: {0}")]
    #[diagnostic(code(nyx_utils::lock::acquire))]
    AcquireFailed(String),
}

pub type PathResult<T> = std::result::Result<T, PathError>;
pub type LockResult<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_path_error_display() {
        assert_eq!(PathError::Empty.to_string(), "Path is empty");

        let err = PathError::MissingEnvVar {
            var: "NYX_ROOT".to_string(),
            input: "$NYX_ROOT/db".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Environment variable `NYX_ROOT` not set in `$NYX_ROOT/db`"
        );
    }

    #[test]
    fn test_lock_error_source() {
        let err = LockError::Open {
            path: PathBuf::from("/locks/sync-core.lock"),
            source: std::io::Error::other("denied"),
        };
        assert!(err.to_string().contains("sync-core.lock"));
        assert!(err.source().is_some());
    }
}
