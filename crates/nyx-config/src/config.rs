use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{LazyLock, RwLock},
};

use nyx_utils::path::{resolve_path, xdg_config_home, xdg_data_home, xdg_runtime_dir};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{ConfigError, Result},
    repository::{default_repositories, Repository},
};

pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 100;

/// What a sync run does with a metadata block that fails to parse.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Fail the whole run; the catalog is left untouched.
    #[default]
    Abort,
    /// Log and skip the offending package, reconcile the rest.
    Skip,
}

/// Application configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Path of the SQLite package catalog.
    /// Default: $XDG_DATA_HOME/nyx/pkginfo.db
    pub db_path: Option<String>,

    /// Directory holding the per-repository sync lock files.
    /// Default: $XDG_RUNTIME_DIR/nyx/locks
    pub lock_dir: Option<String>,

    /// Number of records written per INSERT statement during a sync.
    /// Default: 100
    pub insert_chunk_size: Option<usize>,

    /// Policy for metadata blocks that cannot be parsed ("abort" or "skip").
    /// Default: "abort"
    pub on_parse_error: Option<ParseErrorPolicy>,

    /// Repositories mirrored into the catalog.
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("NYX_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("nyx").join("config.toml"),
    })
});

/// Loads the configuration file into the global [`CONFIG`].
pub fn init() -> Result<()> {
    let path = config_path();
    let config = Config::load(&path)?;
    *CONFIG.write().unwrap_or_else(|e| e.into_inner()) = Some(config);
    Ok(())
}

pub fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .to_path_buf()
}

pub fn set_config_path(path: PathBuf) {
    *CONFIG_PATH.write().unwrap_or_else(|e| e.into_inner()) = path;
}

/// Returns the loaded configuration, or the defaults if [`init`] was never called.
pub fn get_config() -> Config {
    CONFIG
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
        .unwrap_or_default()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            lock_dir: None,
            insert_chunk_size: Some(DEFAULT_INSERT_CHUNK_SIZE),
            on_parse_error: Some(ParseErrorPolicy::Abort),
            repositories: default_repositories(),
        }
    }
}

impl Config {
    /// Reads and validates the config at `path`, falling back to the
    /// defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: Config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;
        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        let chunk_size = *self
            .insert_chunk_size
            .get_or_insert(DEFAULT_INSERT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize(chunk_size));
        }
        self.on_parse_error.get_or_insert(ParseErrorPolicy::default());

        let mut seen = HashSet::new();
        for repo in &mut self.repositories {
            repo.validate()?;
            if !seen.insert(repo.name.clone()) {
                return Err(ConfigError::DuplicateRepositoryName(repo.name.clone()));
            }
            repo.enabled.get_or_insert(true);
        }

        Ok(())
    }

    pub fn get_db_path(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("NYX_DB") {
            return Ok(resolve_path(&env_path)?);
        }
        match &self.db_path {
            Some(path) => Ok(resolve_path(path)?),
            None => Ok(xdg_data_home().join("nyx").join("pkginfo.db")),
        }
    }

    pub fn get_lock_dir(&self) -> Result<PathBuf> {
        match &self.lock_dir {
            Some(path) => Ok(resolve_path(path)?),
            None => Ok(xdg_runtime_dir().join("nyx").join("locks")),
        }
    }

    pub fn insert_chunk_size(&self) -> usize {
        self.insert_chunk_size.unwrap_or(DEFAULT_INSERT_CHUNK_SIZE)
    }

    pub fn parse_error_policy(&self) -> ParseErrorPolicy {
        self.on_parse_error.unwrap_or_default()
    }

    /// Looks up an enabled repository by tag.
    pub fn get_repository(&self, name: &str) -> Result<&Repository> {
        self.repositories
            .iter()
            .find(|repo| repo.name == name && repo.is_enabled())
            .ok_or_else(|| ConfigError::UnknownRepository(name.to_string()))
    }

    pub fn enabled_repositories(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter().filter(|repo| repo.is_enabled())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Writes the default configuration to `path`, refusing to overwrite.
pub fn generate_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, Config::default().to_toml()?)?;

    info!("Default configuration written to {}", path.display());
    Ok(())
}
