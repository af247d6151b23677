pub mod commands;
mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod prompts;
pub mod results;
pub mod reveal;
pub mod settings;
pub mod storage;
mod utils;

use std::{fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use log::{info, warn};

pub use db::Database;
pub use error::{ExportError, RecordError};
pub use prompts::TextStream;
pub use results::{ResultStore, ResultsView};
pub use reveal::RevealController;
pub use settings::{SettingsStore, UserSettings};
pub use storage::{MemoryStorage, SlotStorage};
pub use utils::init_logging;

const DATABASE_FILE: &str = "results.sqlite3";
const SETTINGS_FILE: &str = "settings.json";

/// Everything the front end's commands operate on.
pub struct AppState {
    pub(crate) store: ResultStore,
    pub(crate) settings: SettingsStore,
    interpretation: RevealController,
    treatment: RevealController,
    persistence_degraded: bool,
}

impl AppState {
    /// Opens settings and the results database under `data_dir`. When the
    /// database cannot be opened the history is kept in memory for this
    /// session only and [`AppState::persistence_degraded`] reports it.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE))?;

        let db_path = data_dir.join(DATABASE_FILE);
        let (storage, degraded): (Arc<dyn SlotStorage>, bool) = match Database::new(db_path) {
            Ok(database) => {
                info!("Results database ready at {}", database.path().display());
                (Arc::new(database), false)
            }
            Err(err) => {
                warn!("Results database unavailable, keeping history in memory: {err:#}");
                (Arc::new(MemoryStorage::new()), true)
            }
        };

        let mut state = Self::with_storage(storage, settings);
        state.persistence_degraded = degraded;
        Ok(state)
    }

    pub fn with_storage(storage: Arc<dyn SlotStorage>, settings: SettingsStore) -> Self {
        let store = ResultStore::new(storage).with_tolerance(settings.probability_tolerance());
        Self {
            store,
            settings,
            interpretation: RevealController::new("interpretation"),
            treatment: RevealController::new("treatment"),
            persistence_degraded: false,
        }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn reveal(&self, stream: TextStream) -> &RevealController {
        match stream {
            TextStream::Interpretation => &self.interpretation,
            TextStream::Treatment => &self.treatment,
        }
    }

    pub fn persistence_degraded(&self) -> bool {
        self.persistence_degraded
    }
}
