//! The SmartGrid controller
//
// This module holds the `SmartGrid` struct (fields and lifecycle) and
// declares submodules that implement the grid's operations by concern.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use smartgrid_core::{
    ColumnDescriptor, Notice, NoticeQueue, Row, RowId, RowMutationHandler,
};
use smartgrid_settings::{PreferenceModel, PreferenceScope, PreferenceStore};

use crate::edit::{CellEditController, FormValidator, SubRowConfig};
use crate::events::GridEvent;
use crate::expansion::ExpansionManager;
use crate::filter::{FilterField, FilterPanel, QuickFilters};
use crate::filter_sets::FilterSetManager;
use crate::gate::{GridAction, LoadingGate};
use crate::group::RowGroup;
use crate::options::LazyOptionLoader;
use crate::pagination::PaginationState;
use crate::plugin::PluginHost;
use crate::selection::SelectionManager;
use crate::sort::SortController;

mod config;
mod editing;
mod filtering;
mod pipeline;
mod plugins;
mod preferences;
mod selection;

pub use config::{DataMode, GridConfig, SmartGridBuilder};
pub use pipeline::GridRow;

/// Headless tabular engine over one dataset
///
/// Fields are `pub(super)` so submodules under `grid/` can access them.
pub struct SmartGrid {
    pub(super) config: GridConfig,
    pub(super) columns: Vec<ColumnDescriptor>,

    /// Dataset rows as supplied (client mode) or the current page (server mode)
    pub(super) rows: Vec<Row>,
    /// Identity of each row in `rows`
    pub(super) row_ids: Vec<RowId>,
    /// Total reported by the host in server mode
    pub(super) server_total: Option<usize>,

    pub(super) preferences: PreferenceModel,
    pub(super) quick_filters: QuickFilters,
    pub(super) filter_panel: FilterPanel,
    /// Caller-supplied filter fields beyond the columns
    pub(super) extra_filter_fields: Vec<FilterField>,
    pub(super) filter_sets: Option<FilterSetManager>,
    pub(super) sort: SortController,
    pub(super) group_by: Option<String>,
    pub(super) pagination: PaginationState,
    pub(super) selection: SelectionManager,
    pub(super) sub_rows: Option<SubRowConfig>,
    pub(super) expansion: Option<ExpansionManager>,

    pub(super) cell_edit: CellEditController,
    /// Lazy option loaders for cell editors, keyed by `option_key`
    pub(super) cell_loaders: HashMap<String, LazyOptionLoader>,
    pub(super) mutation_handler: Option<Arc<dyn RowMutationHandler>>,
    pub(super) validator: FormValidator,

    pub(super) plugins: PluginHost,
    pub(super) gate: LoadingGate,
    pub(super) events: Vec<GridEvent>,
    pub(super) notices: NoticeQueue,

    /// Dataset positions after filtering, sorting and grouping
    pub(super) processed: Vec<usize>,
    pub(super) groups: Vec<RowGroup>,
    /// Current page as a range into `processed`
    pub(super) page: Range<usize>,
    pub(super) mounted: bool,
}

impl SmartGrid {
    pub fn builder(config: GridConfig) -> SmartGridBuilder {
        SmartGridBuilder::new(config)
    }

    fn from_builder(builder: SmartGridBuilder, store: Arc<dyn PreferenceStore>) -> Self {
        let SmartGridBuilder {
            config,
            columns,
            rows,
            filter_set_api,
            extra_filter_fields,
            mutation_handler,
            sub_rows,
            validator,
            plugins,
            ..
        } = builder;

        let mut scope = PreferenceScope::new(config.grid_id.clone());
        if let Some(user) = &config.user_id {
            scope = scope.for_user(user.clone());
        }
        let preferences = PreferenceModel::new(scope, store, columns.clone(), config.page_size);
        let filter_panel = FilterPanel::from_columns(
            &columns,
            extra_filter_fields.clone(),
            config.option_page_size,
        );
        let filter_sets = filter_set_api
            .map(|api| FilterSetManager::new(api, config.owner(), config.grid_id.clone()));

        let mut selection = SelectionManager::new(config.selection_mode);
        if let Some(sub) = &sub_rows {
            selection = selection.with_nested(sub.selection_mode, sub.selection_scope);
        }
        if let Some(default_selection) = &config.default_selection {
            selection = selection.with_default(default_selection.clone());
        }
        let expansion = sub_rows
            .as_ref()
            .map(|sub| ExpansionManager::new(sub.key.clone(), sub.default_expanded));

        let pagination = PaginationState::new(config.page_size, config.pagination_mode)
            .with_page_sizes(config.available_page_sizes.clone());

        let mut host = PluginHost::new();
        for plugin in plugins {
            host.register(plugin);
        }

        let validator = validator.unwrap_or_default().for_columns(&columns);

        let mut grid = Self {
            sort: SortController::new(config.null_position),
            config,
            columns,
            rows,
            row_ids: Vec::new(),
            server_total: None,
            preferences,
            quick_filters: QuickFilters::new(),
            filter_panel,
            extra_filter_fields,
            filter_sets,
            group_by: None,
            pagination,
            selection,
            sub_rows,
            expansion,
            cell_edit: CellEditController::new(),
            cell_loaders: HashMap::new(),
            mutation_handler,
            validator,
            plugins: host,
            gate: LoadingGate::new(),
            events: Vec::new(),
            notices: NoticeQueue::new(),
            processed: Vec::new(),
            groups: Vec::new(),
            page: 0..0,
            mounted: false,
        };
        grid.recompute_nested();
        grid.rebuild_ids();
        grid
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Load preferences and filter sets, seed selection and compute the first view
    #[tracing::instrument(skip(self), fields(grid_id = %self.config.grid_id))]
    pub async fn mount(&mut self) {
        if self.mounted {
            tracing::debug!("Grid already mounted");
            return;
        }

        if self.gate.try_begin(GridAction::LoadPreferences).is_ok() {
            let preferences = self.preferences.load_preferences().await.clone();
            self.gate.finish(GridAction::LoadPreferences);

            if self.pagination.set_limit(preferences.page_size) {
                tracing::debug!(page_size = preferences.page_size, "Restored page size");
            }
            self.sort.set(preferences.sort.clone());
            self.filter_panel.restore(&preferences.active_filters);
        }

        self.load_filter_sets().await;
        self.apply_default_filter_set().await;

        self.selection.seed_default(&self.row_ids);
        self.mounted = true;
        tracing::info!(rows = self.rows.len(), "Grid mounted");
        self.refresh();
    }

    /// Drop session state. A later `mount` starts over.
    pub fn unmount(&mut self) {
        self.selection.unmount();
        if let Some(expansion) = &mut self.expansion {
            expansion.reset();
        }
        if let Some(manager) = &mut self.filter_sets {
            manager.reset_mount();
        }
        self.cell_edit.cancel();
        self.cell_loaders.clear();
        self.filter_panel.reset_loaders();
        self.quick_filters.clear();
        self.group_by = None;
        self.pagination.reset();
        self.mounted = false;
        tracing::info!(grid_id = %self.config.grid_id, "Grid unmounted");
    }

    /// Replace the dataset. Selections of rows that disappeared are dropped.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.server_total = None;
        self.after_rows_changed();
    }

    /// Server mode: install the page the host fetched
    pub fn set_server_page(&mut self, rows: Vec<Row>, total: usize) {
        self.rows = rows;
        self.server_total = Some(total);
        self.after_rows_changed();
    }

    /// Server mode, infinite scroll: append the next loaded chunk
    pub fn append_server_rows(&mut self, rows: Vec<Row>, total: usize) {
        self.rows.extend(rows);
        self.server_total = Some(total);
        self.after_rows_changed();
    }

    fn after_rows_changed(&mut self) {
        self.recompute_nested();
        self.rebuild_ids();
        // Server pages hold only part of the data; keep off-page selections
        if self.config.data_mode == DataMode::Client {
            self.prune_selection();
        }
        self.recompute();
    }

    /// Refresh derived nested fields and parent aggregates of every row
    fn recompute_nested(&mut self) {
        if let Some(config) = &self.sub_rows {
            for row in &mut self.rows {
                config.recompute(row);
            }
        }
    }

    pub(super) fn rebuild_ids(&mut self) {
        let key = &self.config.row_key;
        self.row_ids = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| key.resolve_or_position(row, i))
            .collect();
    }

    pub(super) fn index_of(&self, id: &RowId) -> Option<usize> {
        self.row_ids.iter().position(|r| r == id)
    }

    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.index_of(id).map(|i| &self.rows[i])
    }

    /// Begin an action that the host completes asynchronously.
    ///
    /// Fails with `Busy` while the same action is already pending.
    pub fn begin_action(&mut self, action: GridAction) -> smartgrid_core::GridResult<()> {
        self.gate.try_begin(action)
    }

    pub fn finish_action(&mut self, action: GridAction) {
        self.gate.finish(action);
    }

    pub fn is_loading(&self, action: GridAction) -> bool {
        self.gate.is_loading(action)
    }

    /// Events raised since the last call
    pub fn take_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    /// Notices raised since the last call, including collaborator failures
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = self.preferences.take_notices();
        if let Some(manager) = &mut self.filter_sets {
            notices.extend(manager.take_notices());
        }
        notices.extend(self.notices.drain());
        notices
    }
}
