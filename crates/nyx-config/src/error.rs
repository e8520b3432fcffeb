use miette::Diagnostic;
use nyx_utils::error::PathError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(nyx_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(nyx_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(nyx_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Invalid repository name: {0:?}")]
    #[diagnostic(
        code(nyx_config::invalid_repository),
        help("Repository names may only contain letters, digits, '.', '_' and '-'")
    )]
    InvalidRepository(String),

    #[error("Duplicate repository name: {0}")]
    #[diagnostic(
        code(nyx_config::duplicate_repo),
        help("Each repository must have a unique name")
    )]
    DuplicateRepositoryName(String),

    #[error("Unknown repository: {0}")]
    #[diagnostic(
        code(nyx_config::unknown_repo),
        help("Add the repository to the [[repositories]] list or enable it")
    )]
    UnknownRepository(String),

    #[error("Invalid insert chunk size: {0}")]
    #[diagnostic(
        code(nyx_config::chunk_size),
        help("insert_chunk_size must be greater than zero")
    )]
    InvalidChunkSize(usize),

    #[error("Invalid sync interval for repository {repo}: {value}")]
    #[diagnostic(
        code(nyx_config::sync_interval),
        help("Use 'always', 'never' or a duration such as '30m', '3h', '1d'")
    )]
    InvalidSyncInterval { repo: String, value: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error("IO error: {0}")]
    #[diagnostic(code(nyx_config::io))]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
