use super::*;

use smartgrid_core::{
    FilterCondition, FilterOperator, GridError, GridResult, SortDirection, SortState, Value,
};

use crate::filter_sets::FilterSet;
use crate::options::FetchOutcome;
use crate::pagination::PaginationMode;

impl SmartGrid {
    // Quick filters

    /// Set the quick filter text of a column. Blank text removes it.
    pub fn set_quick_filter(&mut self, key: &str, text: &str) -> bool {
        if !self.quick_filters.set(key, text) {
            return false;
        }
        tracing::debug!(column = key, "Quick filter changed");
        self.pagination.reset();
        self.refresh();
        true
    }

    pub fn clear_quick_filters(&mut self) {
        if self.quick_filters.clear() {
            self.pagination.reset();
            self.refresh();
        }
    }

    pub fn quick_filters(&self) -> &QuickFilters {
        &self.quick_filters
    }

    // Advanced filter panel

    pub fn filter_panel(&self) -> &FilterPanel {
        &self.filter_panel
    }

    /// Set a panel value without applying it
    pub fn set_filter_value(&mut self, key: &str, value: Value) -> GridResult<()> {
        self.filter_panel.set_value(key, value)
    }

    pub fn set_filter_operator(&mut self, key: &str, operator: FilterOperator) -> GridResult<()> {
        self.filter_panel.set_operator(key, operator)
    }

    pub fn active_filters(&self) -> &[FilterCondition] {
        self.filter_panel.applied()
    }

    /// Turn the panel values into the active conditions and persist them
    #[tracing::instrument(skip(self), fields(grid_id = %self.config.grid_id))]
    pub async fn apply_filters(&mut self) -> Vec<FilterCondition> {
        let conditions = self.filter_panel.handle_apply();
        self.preferences.set_active_filters(conditions.clone()).await;
        self.events.push(GridEvent::FiltersApplied(conditions.clone()));
        self.pagination.reset();
        self.refresh();
        conditions
    }

    /// Empty the panel and drop all active conditions
    #[tracing::instrument(skip(self), fields(grid_id = %self.config.grid_id))]
    pub async fn clear_filters(&mut self) {
        self.filter_panel.handle_clear();
        self.preferences.set_active_filters(Vec::new()).await;
        self.events.push(GridEvent::FiltersCleared);
        self.pagination.reset();
        self.refresh();
    }

    /// Search the options of a lazy filter field
    pub async fn search_filter_options(&mut self, key: &str, term: &str) -> GridResult<FetchOutcome> {
        let loader = self
            .filter_panel
            .loader_mut(key)
            .ok_or_else(|| GridError::NotFound(format!("lazy filter field '{}'", key)))?;
        let outcome = loader.search(term, None).await;
        self.report_fetch(key, &outcome);
        Ok(outcome)
    }

    pub async fn load_more_filter_options(&mut self, key: &str) -> GridResult<Option<FetchOutcome>> {
        let loader = self
            .filter_panel
            .loader_mut(key)
            .ok_or_else(|| GridError::NotFound(format!("lazy filter field '{}'", key)))?;
        let outcome = loader.load_more().await;
        if let Some(outcome) = &outcome {
            self.report_fetch(key, outcome);
        }
        Ok(outcome)
    }

    pub(super) fn report_fetch(&mut self, key: &str, outcome: &FetchOutcome) {
        if let FetchOutcome::Failed(message) = outcome {
            self.notices.push(Notice::warning(format!(
                "Options for '{}' could not be loaded: {}",
                key, message
            )));
        }
    }

    // Filter sets

    pub fn filter_sets(&self) -> &[FilterSet] {
        self.filter_sets.as_ref().map(|m| m.sets()).unwrap_or(&[])
    }

    fn filter_set_manager(&mut self) -> Option<&mut FilterSetManager> {
        if self.filter_sets.is_none() {
            self.notices
                .push(Notice::warning("Saved filters are not available for this grid"));
        }
        self.filter_sets.as_mut()
    }

    /// Refresh the cached filter sets
    pub async fn load_filter_sets(&mut self) {
        let Some(manager) = self.filter_sets.as_mut() else {
            return;
        };
        if self.gate.try_begin(GridAction::LoadFilterSets).is_err() {
            return;
        }
        manager.load().await;
        self.gate.finish(GridAction::LoadFilterSets);
    }

    /// Apply the default filter set, once per mount, when nothing is filtered
    pub(super) async fn apply_default_filter_set(&mut self) {
        let has_active = !self.filter_panel.applied().is_empty() || !self.quick_filters.is_empty();
        let Some(set) = self
            .filter_sets
            .as_mut()
            .and_then(|m| m.take_default_for_mount(has_active))
        else {
            return;
        };
        tracing::info!(id = %set.id, "Applying default filter set");
        self.apply_loaded_filter_set(set).await;
    }

    /// Load a saved set into the panel and apply it immediately
    pub async fn apply_filter_set(&mut self, id: &str) -> GridResult<Vec<FilterCondition>> {
        let set = self
            .filter_sets
            .as_ref()
            .and_then(|m| m.get(id))
            .cloned()
            .ok_or_else(|| GridError::NotFound(format!("filter set '{}'", id)))?;
        Ok(self.apply_loaded_filter_set(set).await)
    }

    async fn apply_loaded_filter_set(&mut self, set: FilterSet) -> Vec<FilterCondition> {
        self.filter_panel.load_values(&set.filters);
        let conditions = self.apply_filters().await;
        self.events.push(GridEvent::FilterSetApplied {
            id: set.id,
            name: set.name,
        });
        conditions
    }

    /// Save the current panel values as a named set
    pub async fn save_filter_set(&mut self, name: &str, make_default: bool) -> GridResult<Option<FilterSet>> {
        let filters = self.filter_panel.values().clone();
        self.gate.try_begin(GridAction::SaveFilterSet)?;
        let saved = match self.filter_set_manager() {
            Some(manager) => manager.save(name, filters, make_default).await,
            None => None,
        };
        self.gate.finish(GridAction::SaveFilterSet);
        Ok(saved)
    }

    pub async fn rename_filter_set(&mut self, id: &str, name: &str) -> GridResult<bool> {
        self.gate.try_begin(GridAction::UpdateFilterSet)?;
        let renamed = match self.filter_set_manager() {
            Some(manager) => manager.rename(id, name).await,
            None => false,
        };
        self.gate.finish(GridAction::UpdateFilterSet);
        Ok(renamed)
    }

    /// Overwrite a saved set with the current panel values
    pub async fn update_filter_set(&mut self, id: &str) -> GridResult<bool> {
        let filters = self.filter_panel.values().clone();
        self.gate.try_begin(GridAction::UpdateFilterSet)?;
        let updated = match self.filter_set_manager() {
            Some(manager) => manager.update_filters(id, filters).await,
            None => false,
        };
        self.gate.finish(GridAction::UpdateFilterSet);
        Ok(updated)
    }

    pub async fn set_default_filter_set(&mut self, id: &str) -> GridResult<bool> {
        self.gate.try_begin(GridAction::UpdateFilterSet)?;
        let promoted = match self.filter_set_manager() {
            Some(manager) => manager.set_default(id).await,
            None => false,
        };
        self.gate.finish(GridAction::UpdateFilterSet);
        Ok(promoted)
    }

    pub async fn delete_filter_set(&mut self, id: &str) -> GridResult<bool> {
        self.gate.try_begin(GridAction::DeleteFilterSet)?;
        let deleted = match self.filter_set_manager() {
            Some(manager) => manager.delete(id).await,
            None => false,
        };
        self.gate.finish(GridAction::DeleteFilterSet);
        Ok(deleted)
    }

    // Sorting

    pub fn sort_state(&self) -> Option<&SortState> {
        self.sort.state()
    }

    /// Replace the active sort. `None` removes it.
    #[tracing::instrument(skip(self), fields(grid_id = %self.config.grid_id))]
    pub async fn set_sort(&mut self, sort: Option<SortState>) -> GridResult<()> {
        if let Some(state) = &sort {
            let sortable = self.column(&state.field).is_some_and(|c| c.sortable);
            if !sortable {
                return Err(GridError::InvalidValue(format!(
                    "column '{}' is not sortable",
                    state.field
                )));
            }
        }
        self.sort.set(sort.clone());
        self.after_sort_changed(sort).await;
        Ok(())
    }

    pub async fn sort_by(&mut self, field: &str, direction: SortDirection) -> GridResult<()> {
        self.set_sort(Some(SortState {
            field: field.to_string(),
            direction,
        }))
        .await
    }

    /// Cycle a column header through ascending, descending and unsorted
    pub async fn toggle_sort(&mut self, field: &str) -> GridResult<Option<SortState>> {
        if !self.column(field).is_some_and(|c| c.sortable) {
            return Err(GridError::InvalidValue(format!("column '{}' is not sortable", field)));
        }
        let next = self.sort.toggle(field).cloned();
        self.after_sort_changed(next.clone()).await;
        Ok(next)
    }

    async fn after_sort_changed(&mut self, sort: Option<SortState>) {
        tracing::info!(sort = ?sort, "Sort changed");
        self.preferences.set_sort(sort.clone()).await;
        self.events.push(GridEvent::SortChanged(sort));
        self.pagination.reset();
        self.refresh();
    }

    // Grouping

    pub fn group_by_field(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    /// Group by a groupable column, or flatten with `None`
    pub fn set_group_by(&mut self, field: Option<&str>) -> GridResult<()> {
        if let Some(key) = field {
            let groupable = self.column(key).is_some_and(|c| c.groupable);
            if !groupable {
                return Err(GridError::InvalidValue(format!(
                    "column '{}' is not groupable",
                    key
                )));
            }
        }
        self.group_by = field.map(str::to_string);
        tracing::info!(group_by = ?self.group_by, "Grouping changed");
        self.events.push(GridEvent::GroupingChanged(self.group_by.clone()));
        self.pagination.reset();
        self.recompute();
        Ok(())
    }

    // Pagination

    fn after_page_changed(&mut self, changed: bool) -> bool {
        if changed {
            self.events.push(GridEvent::PageChanged {
                page: self.pagination.current_page,
                page_size: self.pagination.records_per_page,
            });
            self.refresh();
        }
        changed
    }

    pub fn next_page(&mut self) -> bool {
        let changed = self.pagination.go_next();
        self.after_page_changed(changed)
    }

    pub fn prev_page(&mut self) -> bool {
        let changed = self.pagination.go_prev();
        self.after_page_changed(changed)
    }

    pub fn first_page(&mut self) -> bool {
        let changed = self.pagination.go_first();
        self.after_page_changed(changed)
    }

    pub fn last_page(&mut self) -> bool {
        let changed = self.pagination.go_last();
        self.after_page_changed(changed)
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        let changed = self.pagination.go_to_page(page);
        self.after_page_changed(changed)
    }

    /// Change the page size and persist it
    pub async fn set_page_size(&mut self, page_size: usize) -> bool {
        if !self.pagination.set_limit(page_size) {
            return false;
        }
        self.preferences.set_page_size(page_size).await;
        self.after_page_changed(true)
    }

    pub fn set_pagination_mode(&mut self, mode: PaginationMode) -> bool {
        let changed = self.pagination.set_mode(mode);
        self.after_page_changed(changed)
    }

    /// Infinite scroll: extend the loaded window by one page
    pub fn load_more(&mut self) -> bool {
        if self.pagination.pagination_mode != PaginationMode::InfiniteScroll {
            return false;
        }
        match self.config.data_mode {
            DataMode::Client => {
                if !self.pagination.load_more() {
                    return false;
                }
                self.recompute();
                true
            }
            DataMode::Server => {
                let loaded = self.rows.len();
                let more = self.server_total.is_none_or(|total| loaded < total);
                if more {
                    self.events.push(GridEvent::LoadMoreRequested { loaded });
                }
                more
            }
        }
    }
}
