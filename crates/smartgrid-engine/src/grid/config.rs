//! Grid configuration and builder

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use smartgrid_core::{ColumnDescriptor, NullPosition, Row, RowKey, RowMutationHandler};
use smartgrid_settings::{DEFAULT_PAGE_SIZE, LocalPreferenceStore, PreferenceStore};

use crate::edit::{FormValidator, SubRowConfig};
use crate::filter::FilterField;
use crate::filter_sets::{FilterSetApi, SqliteFilterSetStore};
use crate::options::DEFAULT_OPTION_PAGE_SIZE;
use crate::pagination::{DEFAULT_PAGE_SIZES, PaginationMode};
use crate::plugin::GridPlugin;
use crate::selection::{DefaultSelection, SelectionMode};

use super::SmartGrid;

/// Where filtering, sorting and paging happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// Rows are processed in memory
    #[default]
    Client,
    /// The host fetches each page; the grid emits `DataRequested`
    Server,
}

/// Serializable grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub grid_id: String,
    pub user_id: Option<String>,
    pub row_key: RowKey,
    pub page_size: usize,
    pub available_page_sizes: Vec<usize>,
    pub pagination_mode: PaginationMode,
    pub data_mode: DataMode,
    pub selection_mode: SelectionMode,
    pub default_selection: Option<DefaultSelection>,
    pub null_position: NullPosition,
    pub option_page_size: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_id: "grid".to_string(),
            user_id: None,
            row_key: RowKey::default(),
            page_size: DEFAULT_PAGE_SIZE,
            available_page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
            pagination_mode: PaginationMode::default(),
            data_mode: DataMode::default(),
            selection_mode: SelectionMode::Multi,
            default_selection: None,
            null_position: NullPosition::default(),
            option_page_size: DEFAULT_OPTION_PAGE_SIZE,
        }
    }
}

impl GridConfig {
    pub fn new(grid_id: impl Into<String>) -> Self {
        Self {
            grid_id: grid_id.into(),
            ..Self::default()
        }
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Owner recorded on saved filter sets
    pub fn owner(&self) -> &str {
        self.user_id.as_deref().unwrap_or("local")
    }
}

/// Assembles a `SmartGrid` from its configuration and collaborators
pub struct SmartGridBuilder {
    pub(super) config: GridConfig,
    pub(super) columns: Vec<ColumnDescriptor>,
    pub(super) rows: Vec<Row>,
    pub(super) preference_store: Option<Arc<dyn PreferenceStore>>,
    pub(super) filter_set_api: Option<Arc<dyn FilterSetApi>>,
    pub(super) extra_filter_fields: Vec<FilterField>,
    pub(super) mutation_handler: Option<Arc<dyn RowMutationHandler>>,
    pub(super) sub_rows: Option<SubRowConfig>,
    pub(super) validator: Option<FormValidator>,
    pub(super) plugins: Vec<Arc<dyn GridPlugin>>,
}

impl SmartGridBuilder {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            columns: Vec::new(),
            rows: Vec::new(),
            preference_store: None,
            filter_set_api: None,
            extra_filter_fields: Vec::new(),
            mutation_handler: None,
            sub_rows: None,
            validator: None,
            plugins: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        self.columns = columns;
        self
    }

    pub fn rows(mut self, rows: Vec<Row>) -> Self {
        self.rows = rows;
        self
    }

    pub fn preference_store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preference_store = Some(store);
        self
    }

    pub fn filter_set_api(mut self, api: Arc<dyn FilterSetApi>) -> Self {
        self.filter_set_api = Some(api);
        self
    }

    /// Keep filter sets in the SQLite store under the user data directory
    pub fn local_filter_sets(mut self) -> anyhow::Result<Self> {
        self.filter_set_api = Some(Arc::new(SqliteFilterSetStore::open_default()?));
        Ok(self)
    }

    pub fn extra_filter_field(mut self, field: FilterField) -> Self {
        self.extra_filter_fields.push(field);
        self
    }

    pub fn mutation_handler(mut self, handler: Arc<dyn RowMutationHandler>) -> Self {
        self.mutation_handler = Some(handler);
        self
    }

    pub fn sub_rows(mut self, config: SubRowConfig) -> Self {
        self.sub_rows = Some(config);
        self
    }

    pub fn validator(mut self, validator: FormValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn plugin(mut self, plugin: Arc<dyn GridPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn build(mut self) -> SmartGrid {
        let store = self.preference_store.take().unwrap_or_else(|| {
            tracing::debug!(grid_id = %self.config.grid_id, "No preference store injected, using local store");
            Arc::new(LocalPreferenceStore::open_default_or_memory())
        });
        SmartGrid::from_builder(self, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: GridConfig = serde_json::from_str(
            r#"{"grid_id": "trips", "page_size": 50, "data_mode": "server", "selection_mode": "single"}"#,
        )
        .unwrap();
        assert_eq!(config.grid_id, "trips");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.data_mode, DataMode::Server);
        assert_eq!(config.selection_mode, SelectionMode::Single);
        assert_eq!(config.pagination_mode, PaginationMode::PageBased);
        assert_eq!(config.owner(), "local");
    }

    #[test]
    fn test_default_selection_by_indices() {
        let config: GridConfig =
            serde_json::from_str(r#"{"default_selection": {"indices": [0, 2, 4]}}"#).unwrap();
        assert_eq!(
            config.default_selection,
            Some(DefaultSelection::Indices(vec![0, 2, 4]))
        );
    }
}
