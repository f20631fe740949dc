//! Preference persistence contract and its client-local implementation

use async_trait::async_trait;
use std::sync::Arc;

use smartgrid_core::{GridError, GridResult};

use crate::kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
use crate::preferences::{GridPreferences, PREFERENCES_VERSION};
use crate::settings_file::preferences_db_file;

/// Identifies whose preferences for which grid
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreferenceScope {
    pub grid_id: String,
    pub user_id: Option<String>,
}

impl PreferenceScope {
    pub fn new(grid_id: impl Into<String>) -> Self {
        Self {
            grid_id: grid_id.into(),
            user_id: None,
        }
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Key used in the client-local store
    pub fn storage_key(&self) -> String {
        match &self.user_id {
            Some(user) => format!("smartgrid:prefs:{}:{}", self.grid_id, user),
            None => format!("smartgrid:prefs:{}", self.grid_id),
        }
    }
}

/// Loads and saves grid preferences
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// `Ok(None)` when nothing usable is stored yet
    async fn load(&self, scope: &PreferenceScope) -> GridResult<Option<GridPreferences>>;

    async fn save(&self, scope: &PreferenceScope, preferences: &GridPreferences) -> GridResult<()>;
}

/// Preference store over a client-local key-value store
pub struct LocalPreferenceStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalPreferenceStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// Open the SQLite store under the user data directory
    pub fn open_default() -> anyhow::Result<Self> {
        let path = preferences_db_file()?;
        Ok(Self::new(Arc::new(SqliteKeyValueStore::open(path)?)))
    }

    /// The on-disk store, or a volatile one if it cannot be opened
    pub fn open_default_or_memory() -> Self {
        match Self::open_default() {
            Ok(store) => store,
            Err(err) => {
                tracing::warn!(
                    "Failed to open local preference store, preferences will not persist: {:#}",
                    err
                );
                Self::in_memory()
            }
        }
    }
}

#[async_trait]
impl PreferenceStore for LocalPreferenceStore {
    async fn load(&self, scope: &PreferenceScope) -> GridResult<Option<GridPreferences>> {
        let key = scope.storage_key();
        let Some(content) = self.kv.get(&key)? else {
            return Ok(None);
        };

        let preferences: GridPreferences = serde_json::from_str(&content)?;

        // Check version compatibility
        if preferences.version != PREFERENCES_VERSION {
            tracing::warn!(
                "Preferences version mismatch for {}: expected {}, got {}. Using defaults.",
                key,
                PREFERENCES_VERSION,
                preferences.version
            );
            return Ok(None);
        }

        Ok(Some(preferences))
    }

    async fn save(&self, scope: &PreferenceScope, preferences: &GridPreferences) -> GridResult<()> {
        let key = scope.storage_key();
        let content = serde_json::to_string(preferences)?;
        self.kv
            .set(&key, &content)
            .map_err(|e| GridError::Persistence(format!("{:#}", e)))?;
        tracing::debug!("Saved preferences to {}", key);
        Ok(())
    }
}
