use std::{sync::LazyLock, time::Duration};

use nyx_utils::time::parse_duration;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

static REPO_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid repository name regex"));

/// A package repository whose snapshot is mirrored into the catalog.
///
/// `name` doubles as the repository tag: every catalog record synchronized
/// from this repository carries it, and a sync run only touches records with
/// the same tag.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Repository {
    /// Unique name of the repository, used as the catalog tag.
    pub name: String,

    /// URL of the repository database snapshot (e.g. `core.db`).
    pub url: String,

    /// Whether the repository is synchronized.
    /// Default: true
    pub enabled: Option<bool>,

    /// How often the snapshot should be refreshed ("30m", "3h", "always", "never").
    /// Default: "3h"
    pub sync_interval: Option<String>,
}

/// Parsed form of [`Repository::sync_interval`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncInterval {
    Always,
    Never,
    Every(Duration),
}

impl SyncInterval {
    /// Whether a snapshot last synchronized `elapsed` ago is due again.
    pub fn is_due(&self, elapsed: Duration) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Every(interval) => elapsed >= *interval,
        }
    }
}

impl Repository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: Some(true),
            sync_interval: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn sync_interval(&self) -> Result<SyncInterval> {
        match self.sync_interval.as_deref().unwrap_or("3h") {
            "always" => Ok(SyncInterval::Always),
            "never" => Ok(SyncInterval::Never),
            value => {
                parse_duration(value)
                    .map(SyncInterval::Every)
                    .ok_or_else(|| {
                        ConfigError::InvalidSyncInterval {
                            repo: self.name.clone(),
                            value: value.to_string(),
                        }
                    })
            }
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !REPO_NAME_RE.is_match(&self.name) {
            return Err(ConfigError::InvalidRepository(self.name.clone()));
        }
        self.sync_interval()?;
        Ok(())
    }
}

pub fn default_repositories() -> Vec<Repository> {
    vec![Repository::new(
        "archlinuxcn",
        "https://repo.archlinuxcn.org/x86_64/archlinuxcn.db",
    )]
}
