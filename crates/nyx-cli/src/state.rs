use nyx_config::config::{self, get_config, Config};
use nyx_core::{Result, SqliteCatalog, SyncOptions, Synchronizer};
use nyx_events::EventSinkHandle;
use tracing::debug;

/// Loaded configuration plus the synchronizer over the on-disk catalog.
pub struct AppState {
    config: Config,
    sync: Synchronizer<SqliteCatalog>,
}

impl AppState {
    pub fn init(events: EventSinkHandle) -> Result<Self> {
        config::init()?;
        let config = get_config();

        let db_path = config.get_db_path()?;
        debug!("opening catalog at {}", db_path.display());
        let store = SqliteCatalog::open(&db_path)?;
        let sync = Synchronizer::new(store, SyncOptions::from_config(&config)?).with_events(events);

        Ok(Self { config, sync })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sync(&self) -> &Synchronizer<SqliteCatalog> {
        &self.sync
    }
}
