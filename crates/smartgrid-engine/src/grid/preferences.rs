use super::*;

use smartgrid_settings::GridPreferences;

impl SmartGrid {
    pub fn preferences(&self) -> &GridPreferences {
        self.preferences.preferences()
    }

    /// Visible columns in the preferred order
    pub fn visible_columns(&self) -> Vec<&ColumnDescriptor> {
        self.preferences
            .preferences()
            .visible_columns()
            .into_iter()
            .filter_map(|key| self.column(key))
            .collect()
    }

    /// Header text of a column, honoring label overrides
    pub fn header_for(&self, key: &str) -> Option<&str> {
        let column = self.column(key)?;
        Some(self.preferences.preferences().header_for(column))
    }

    pub fn width_for(&self, key: &str) -> Option<f32> {
        let column = self.column(key)?;
        self.preferences.preferences().width_for(column)
    }

    /// Show or hide a column. Mandatory columns always stay visible.
    pub async fn toggle_column_visibility(&mut self, key: &str) {
        self.preferences.toggle_column_visibility(key).await;
    }

    pub async fn update_column_order(&mut self, order: Vec<String>) {
        self.preferences.update_column_order(order).await;
    }

    pub async fn update_column_width(&mut self, key: &str, width: f32) {
        self.preferences.update_column_width(key, width).await;
    }

    pub async fn update_column_header(&mut self, key: &str, label: &str) {
        self.preferences.update_column_header(key, label).await;
    }

    pub async fn set_sub_row_columns(&mut self, columns: Vec<String>) {
        self.preferences.set_sub_row_columns(columns).await;
    }

    /// Turn nested sub-rows on or off
    pub async fn set_sub_rows_enabled(&mut self, enabled: bool) {
        self.preferences.set_sub_rows_enabled(enabled).await;
        if !enabled {
            if let Some(expansion) = &mut self.expansion {
                expansion.collapse_all();
            }
        }
    }

    /// Columns shown inside expanded sub-rows
    pub fn sub_row_columns(&self) -> Vec<&ColumnDescriptor> {
        let Some(config) = &self.sub_rows else {
            return Vec::new();
        };
        let chosen = &self.preferences.preferences().sub_row_columns;
        if chosen.is_empty() {
            return config.columns.iter().collect();
        }
        chosen.iter().filter_map(|key| config.column(key)).collect()
    }

    /// Replace the column schema; stored preferences are reconciled with it
    pub async fn update_columns(&mut self, columns: Vec<ColumnDescriptor>) {
        self.columns = columns;
        self.preferences.update_schema(self.columns.clone()).await;
        self.validator = std::mem::take(&mut self.validator).for_columns(&self.columns);

        let applied = self.filter_panel.applied().to_vec();
        self.filter_panel = FilterPanel::from_columns(
            &self.columns,
            self.extra_filter_fields.clone(),
            self.config.option_page_size,
        );
        self.filter_panel.restore(&applied);
        self.cell_loaders.clear();
        self.recompute();
    }

    /// Back to schema defaults; the active sort and filters are dropped too
    pub async fn reset_preferences(&mut self) {
        self.preferences.reset_to_defaults().await;
        self.sort.clear();
        self.filter_panel.handle_clear();
        self.pagination.set_limit(self.preferences.preferences().page_size);
        self.pagination.reset();
        self.refresh();
    }
}
