//! Owned engine state: the region store, its query view, marker sessions and
//! the backing file.

use crate::error::{EngineError, PersistenceError};
use crate::persistence::RegionFile;
use crate::query::QueryService;
use crate::region::Region;
use crate::selection::{RegionDefaults, SelectionStore};
use crate::store::{DefineMode, RegionStore};
use crate::types::PlayerId;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What to do when the region file exists but cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadFailurePolicy {
    /// Refuse to start.
    #[default]
    Abort,
    /// Log the error and start with no regions. The next save overwrites the
    /// unreadable file.
    StartEmpty,
}

/// Settings for [`RegionEngine::init`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub storage_path: PathBuf,
    pub load_failure: LoadFailurePolicy,
    pub defaults: RegionDefaults,
}

impl EngineConfig {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            load_failure: LoadFailurePolicy::default(),
            defaults: RegionDefaults::default(),
        }
    }
}

pub struct RegionEngine {
    store: Arc<RegionStore>,
    query: QueryService,
    selections: SelectionStore,
    file: RegionFile,
    defaults: RegionDefaults,
}

impl RegionEngine {
    /// Loads the region file and builds the store from it.
    pub fn init(config: EngineConfig) -> Result<Self, EngineError> {
        let file = RegionFile::new(config.storage_path);

        let regions = match file.load() {
            Ok(regions) => regions,
            Err(PersistenceError::Codec(e)) if config.load_failure == LoadFailurePolicy::StartEmpty => {
                warn!(
                    "⚠️ Could not decode {} ({}), starting with no regions",
                    file.path().display(),
                    e
                );
                Vec::new()
            }
            Err(e) => {
                error!("❌ Failed to load regions from {}: {}", file.path().display(), e);
                return Err(e.into());
            }
        };

        let store = Arc::new(RegionStore::from_regions(regions));
        let query = QueryService::new(store.clone());
        info!("🗺️ Region engine ready with {} regions", store.len());

        Ok(Self {
            store,
            query,
            selections: SelectionStore::new(),
            file,
            defaults: config.defaults,
        })
    }

    pub fn store(&self) -> &Arc<RegionStore> {
        &self.store
    }

    pub fn query(&self) -> &QueryService {
        &self.query
    }

    pub fn selections(&self) -> &SelectionStore {
        &self.selections
    }

    pub fn defaults(&self) -> &RegionDefaults {
        &self.defaults
    }

    pub fn file(&self) -> &RegionFile {
        &self.file
    }

    /// Writes the current store to the region file.
    pub fn save(&self) -> Result<(), EngineError> {
        self.file.save(&self.store)?;
        Ok(())
    }

    /// Turns the player's marker session into a region and clears the
    /// session once the region is stored. Markers edited in the meantime
    /// keep the session open.
    pub fn confirm_selection(
        &self,
        player: PlayerId,
        key: &str,
        mode: DefineMode,
    ) -> Result<Arc<Region>, EngineError> {
        let (definition, markers) = self.selections.confirm_snapshot(player, key, &self.defaults)?;
        let region = self.store.define(definition, mode)?;
        if !self.selections.clear_if_unchanged(&player, &markers) {
            debug!("Player {} edited markers during confirm, session kept", player);
        }
        info!("✅ Player {} confirmed region '{}'", player, region.key);
        Ok(region)
    }

    /// Saves and drops the engine.
    pub fn shutdown(self) -> Result<(), EngineError> {
        info!("🛑 Shutting down region engine");
        self.save()?;
        info!("✅ Region engine shut down with {} regions saved", self.store.len());
        Ok(())
    }
}
