//! Instance-owned preference cache for one grid
//!
//! Every mutating call replaces the in-memory preferences and then persists
//! them. Persistence failures are logged and queued as notices; they never
//! reach the caller and never roll back the in-memory value.

use std::collections::HashSet;
use std::sync::Arc;

use smartgrid_core::{ColumnDescriptor, FilterCondition, Notice, NoticeQueue, SortState};

use crate::preferences::GridPreferences;
use crate::store::{PreferenceScope, PreferenceStore};

pub struct PreferenceModel {
    scope: PreferenceScope,
    store: Arc<dyn PreferenceStore>,
    columns: Vec<ColumnDescriptor>,
    default_page_size: usize,
    preferences: GridPreferences,
    loaded: bool,
    notices: NoticeQueue,
}

impl PreferenceModel {
    pub fn new(
        scope: PreferenceScope,
        store: Arc<dyn PreferenceStore>,
        columns: Vec<ColumnDescriptor>,
        default_page_size: usize,
    ) -> Self {
        let preferences = GridPreferences::defaults_for(&columns, default_page_size);
        Self {
            scope,
            store,
            columns,
            default_page_size,
            preferences,
            loaded: false,
            notices: NoticeQueue::new(),
        }
    }

    pub fn preferences(&self) -> &GridPreferences {
        &self.preferences
    }

    pub fn scope(&self) -> &PreferenceScope {
        &self.scope
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    fn defaults(&self) -> GridPreferences {
        GridPreferences::defaults_for(&self.columns, self.default_page_size)
    }

    fn is_mandatory(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c.key == key && c.mandatory)
    }

    fn is_known(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c.key == key)
    }

    /// Load stored preferences and merge them with schema defaults.
    ///
    /// The first load for a scope with nothing stored persists the defaults.
    pub async fn load_preferences(&mut self) -> &GridPreferences {
        match self.store.load(&self.scope).await {
            Ok(Some(stored)) => {
                tracing::debug!(grid_id = %self.scope.grid_id, "Loaded grid preferences");
                self.preferences = stored.reconcile(&self.columns);
            }
            Ok(None) => {
                tracing::debug!(grid_id = %self.scope.grid_id, "No stored preferences, using defaults");
                self.preferences = self.defaults();
                self.save_preferences().await;
            }
            Err(err) => {
                tracing::warn!(
                    grid_id = %self.scope.grid_id,
                    "Failed to load grid preferences, using defaults: {}",
                    err
                );
                self.notices
                    .push(Notice::warning("Saved grid settings could not be loaded"));
                self.preferences = self.defaults();
            }
        }
        self.loaded = true;
        &self.preferences
    }

    /// Persist the current preferences
    pub async fn save_preferences(&mut self) {
        if let Err(err) = self.store.save(&self.scope, &self.preferences).await {
            tracing::error!(
                grid_id = %self.scope.grid_id,
                "Failed to save grid preferences: {}",
                err
            );
            self.notices
                .push(Notice::error("Grid settings could not be saved"));
        }
    }

    async fn replace(&mut self, preferences: GridPreferences) {
        self.preferences = preferences;
        self.save_preferences().await;
    }

    /// Re-apply a changed column schema
    pub async fn update_schema(&mut self, columns: Vec<ColumnDescriptor>) {
        self.columns = columns;
        let reconciled = self.preferences.clone().reconcile(&self.columns);
        if reconciled != self.preferences {
            self.replace(reconciled).await;
        }
    }

    /// Flip a column's hidden state. Mandatory and unknown columns are left alone.
    pub async fn toggle_column_visibility(&mut self, key: &str) {
        if self.is_mandatory(key) || !self.is_known(key) {
            tracing::debug!(column = key, "Ignoring visibility toggle");
            return;
        }
        let mut next = self.preferences.clone();
        if !next.hidden_columns.remove(key) {
            next.hidden_columns.insert(key.to_string());
        }
        self.replace(next).await;
    }

    /// Set the column order. The result is reconciled, so it always stays a
    /// permutation of the known keys.
    pub async fn update_column_order(&mut self, order: Vec<String>) {
        let next = GridPreferences {
            column_order: order,
            ..self.preferences.clone()
        }
        .reconcile(&self.columns);
        self.replace(next).await;
    }

    pub async fn update_column_width(&mut self, key: &str, width: f32) {
        if !self.is_known(key) {
            return;
        }
        let mut next = self.preferences.clone();
        next.column_widths.insert(key.to_string(), width);
        self.replace(next).await;
    }

    /// Override a header label. An empty label removes the override.
    pub async fn update_column_header(&mut self, key: &str, label: &str) {
        if !self.is_known(key) {
            return;
        }
        let mut next = self.preferences.clone();
        let label = label.trim();
        if label.is_empty() {
            next.column_headers.remove(key);
        } else {
            next.column_headers.insert(key.to_string(), label.to_string());
        }
        self.replace(next).await;
    }

    pub async fn set_page_size(&mut self, page_size: usize) {
        let next = GridPreferences {
            page_size: page_size.max(1),
            ..self.preferences.clone()
        };
        self.replace(next).await;
    }

    pub async fn set_active_filters(&mut self, filters: Vec<FilterCondition>) {
        let next = GridPreferences {
            active_filters: filters,
            ..self.preferences.clone()
        };
        self.replace(next).await;
    }

    pub async fn set_sort(&mut self, sort: Option<SortState>) {
        let next = GridPreferences {
            sort,
            ..self.preferences.clone()
        };
        self.replace(next).await;
    }

    pub async fn set_sub_row_columns(&mut self, columns: Vec<String>) {
        let mut seen = HashSet::new();
        let columns = columns.into_iter().filter(|c| seen.insert(c.clone())).collect();
        let next = GridPreferences {
            sub_row_columns: columns,
            ..self.preferences.clone()
        };
        self.replace(next).await;
    }

    pub async fn set_sub_rows_enabled(&mut self, enabled: bool) {
        let next = GridPreferences {
            sub_rows_enabled: enabled,
            ..self.preferences.clone()
        };
        self.replace(next).await;
    }

    pub async fn reset_to_defaults(&mut self) {
        let defaults = self.defaults();
        self.replace(defaults).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalPreferenceStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use smartgrid_core::{GridError, GridResult};

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::text("id", "ID").mandatory(),
            ColumnDescriptor::text("name", "Name"),
            ColumnDescriptor::integer("qty", "Quantity"),
        ]
    }

    /// Store whose saves always fail
    #[derive(Default)]
    struct FailingStore {
        save_attempts: Mutex<usize>,
    }

    #[async_trait]
    impl PreferenceStore for FailingStore {
        async fn load(&self, _scope: &PreferenceScope) -> GridResult<Option<GridPreferences>> {
            Err(GridError::Persistence("backend offline".into()))
        }

        async fn save(&self, _scope: &PreferenceScope, _p: &GridPreferences) -> GridResult<()> {
            *self.save_attempts.lock() += 1;
            Err(GridError::Persistence("backend offline".into()))
        }
    }

    fn model_with(store: Arc<dyn PreferenceStore>) -> PreferenceModel {
        PreferenceModel::new(PreferenceScope::new("trips"), store, columns(), 25)
    }

    #[tokio::test]
    async fn test_mandatory_column_cannot_be_hidden() {
        let mut model = model_with(Arc::new(LocalPreferenceStore::in_memory()));
        model.load_preferences().await;

        let before = model.preferences().hidden_columns.clone();
        model.toggle_column_visibility("id").await;
        assert_eq!(model.preferences().hidden_columns, before);
    }

    #[tokio::test]
    async fn test_toggle_visibility_flips() {
        let mut model = model_with(Arc::new(LocalPreferenceStore::in_memory()));
        model.toggle_column_visibility("name").await;
        assert!(model.preferences().is_hidden("name"));
        model.toggle_column_visibility("name").await;
        assert!(!model.preferences().is_hidden("name"));
    }

    #[tokio::test]
    async fn test_changes_persist_across_instances() {
        let store: Arc<dyn PreferenceStore> = Arc::new(LocalPreferenceStore::in_memory());

        let mut first = model_with(store.clone());
        first.load_preferences().await;
        first.set_page_size(100).await;
        first.update_column_order(vec!["qty".into(), "name".into()]).await;

        let mut second = model_with(store);
        let loaded = second.load_preferences().await;
        assert_eq!(loaded.page_size, 100);
        assert_eq!(loaded.column_order, vec!["qty", "name", "id"]);
    }

    #[tokio::test]
    async fn test_load_failure_falls_back_to_defaults() {
        let mut model = model_with(Arc::new(FailingStore::default()));
        let loaded = model.load_preferences().await.clone();

        assert_eq!(loaded, GridPreferences::defaults_for(&columns(), 25));
        assert!(model.is_loaded());
        assert_eq!(model.take_notices().len(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_new_value() {
        let store = Arc::new(FailingStore::default());
        let mut model = model_with(store.clone());

        model.update_column_width("name", 240.0).await;

        assert_eq!(model.preferences().column_widths.get("name"), Some(&240.0));
        assert_eq!(*store.save_attempts.lock(), 1);
        let notices = model.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, smartgrid_core::NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_empty_header_removes_override() {
        let mut model = model_with(Arc::new(LocalPreferenceStore::in_memory()));
        model.update_column_header("qty", "Qty").await;
        assert_eq!(model.preferences().column_headers.get("qty").map(String::as_str), Some("Qty"));
        model.update_column_header("qty", "  ").await;
        assert!(model.preferences().column_headers.is_empty());
    }

    #[tokio::test]
    async fn test_reset_to_defaults() {
        let mut model = model_with(Arc::new(LocalPreferenceStore::in_memory()));
        model.toggle_column_visibility("qty").await;
        model.set_sort(Some(SortState::descending("name"))).await;
        model.reset_to_defaults().await;
        assert_eq!(
            model.preferences(),
            &GridPreferences::defaults_for(&columns(), 25)
        );
    }
}
