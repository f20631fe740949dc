//! Common test utilities and mocks

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;

use smartgrid_core::{
    AddNewHandler, ColumnDescriptor, ColumnKind, GridError, GridResult, OptionItem, OptionQuery,
    OptionSource, Row, RowId, RowMutationHandler,
};
use smartgrid_engine::filter_sets::{FilterSet, FilterSetApi, FilterSetPatch, NewFilterSet};
use smartgrid_settings::{GridPreferences, PreferenceScope, PreferenceStore};

/// In-memory preference store recording every save
#[derive(Default)]
pub struct MockPreferenceStore {
    pub stored: Arc<parking_lot::Mutex<Option<GridPreferences>>>,
    pub save_count: Arc<parking_lot::Mutex<usize>>,
    pub should_fail: bool,
}

impl MockPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(self, preferences: GridPreferences) -> Self {
        *self.stored.lock() = Some(preferences);
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn saved(&self) -> Option<GridPreferences> {
        self.stored.lock().clone()
    }

    pub fn save_count(&self) -> usize {
        *self.save_count.lock()
    }
}

#[async_trait]
impl PreferenceStore for MockPreferenceStore {
    async fn load(&self, _scope: &PreferenceScope) -> GridResult<Option<GridPreferences>> {
        if self.should_fail {
            return Err(GridError::Persistence("preference service offline".into()));
        }
        Ok(self.stored.lock().clone())
    }

    async fn save(&self, _scope: &PreferenceScope, preferences: &GridPreferences) -> GridResult<()> {
        *self.save_count.lock() += 1;
        if self.should_fail {
            return Err(GridError::Persistence("preference service offline".into()));
        }
        *self.stored.lock() = Some(preferences.clone());
        Ok(())
    }
}

/// Filter-set API backed by a vector, with a call log
#[derive(Default)]
pub struct MockFilterSetApi {
    pub sets: Arc<parking_lot::Mutex<Vec<FilterSet>>>,
    pub call_log: Arc<parking_lot::Mutex<Vec<String>>>,
    pub should_fail: bool,
}

impl MockFilterSetApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_set(self, set: FilterSet) -> Self {
        self.sets.lock().push(set);
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn call_log(&self) -> Vec<String> {
        self.call_log.lock().clone()
    }

    fn check(&self, call: &str) -> GridResult<()> {
        self.call_log.lock().push(call.to_string());
        if self.should_fail {
            return Err(GridError::Storage("filter set service offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl FilterSetApi for MockFilterSetApi {
    async fn get_user_filter_sets(&self, owner: &str, grid_id: &str) -> GridResult<Vec<FilterSet>> {
        self.check("get")?;
        Ok(self
            .sets
            .lock()
            .iter()
            .filter(|s| s.owner == owner && s.grid_id == grid_id)
            .cloned()
            .collect())
    }

    async fn save_user_filter_set(&self, set: NewFilterSet) -> GridResult<FilterSet> {
        self.check("save")?;
        let now = chrono::Utc::now();
        let saved = FilterSet {
            id: uuid::Uuid::new_v4().to_string(),
            owner: set.owner,
            grid_id: set.grid_id,
            name: set.name,
            filters: set.filters,
            is_default: set.is_default,
            created_at: now,
            updated_at: now,
        };
        self.sets.lock().push(saved.clone());
        Ok(saved)
    }

    async fn update_filter_set(&self, id: &str, patch: FilterSetPatch) -> GridResult<FilterSet> {
        self.check("update")?;
        let mut sets = self.sets.lock();
        let set = sets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| GridError::NotFound(format!("filter set '{}'", id)))?;
        if let Some(name) = patch.name {
            set.name = name;
        }
        if let Some(filters) = patch.filters {
            set.filters = filters;
        }
        if let Some(is_default) = patch.is_default {
            set.is_default = is_default;
        }
        set.updated_at = chrono::Utc::now();
        Ok(set.clone())
    }

    async fn delete_filter_set(&self, id: &str) -> GridResult<()> {
        self.check("delete")?;
        self.sets.lock().retain(|s| s.id != id);
        Ok(())
    }
}

/// Mutation handler recording calls; can be switched to reject them
#[derive(Default)]
pub struct MockMutationHandler {
    pub call_log: Arc<parking_lot::Mutex<Vec<String>>>,
    pub should_fail: Arc<parking_lot::Mutex<bool>>,
    /// Id assigned to added rows that have none
    pub next_id: Arc<parking_lot::Mutex<i64>>,
}

impl MockMutationHandler {
    pub fn new() -> Self {
        Self {
            next_id: Arc::new(parking_lot::Mutex::new(1000)),
            ..Self::default()
        }
    }

    pub fn with_failure(self) -> Self {
        *self.should_fail.lock() = true;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        *self.should_fail.lock() = failing;
    }

    pub fn call_log(&self) -> Vec<String> {
        self.call_log.lock().clone()
    }

    fn record(&self, call: String) -> GridResult<()> {
        self.call_log.lock().push(call);
        if *self.should_fail.lock() {
            return Err(GridError::Mutation("backend rejected the change".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RowMutationHandler for MockMutationHandler {
    async fn on_add_row(&self, row: &Row) -> GridResult<Row> {
        self.record("add".to_string())?;
        let mut stored = row.clone();
        if stored.value("id").is_empty() {
            let mut next = self.next_id.lock();
            stored.set("id", *next);
            *next += 1;
        }
        Ok(stored)
    }

    async fn on_edit_row(&self, id: &RowId, _row: &Row) -> GridResult<()> {
        self.record(format!("edit:{}", id))
    }

    async fn on_delete_row(&self, id: &RowId, _row: &Row) -> GridResult<()> {
        self.record(format!("delete:{}", id))
    }
}

/// Option source over a fixed list, recording each query
pub struct MockOptionSource {
    pub options: Vec<OptionItem>,
    pub queries: Arc<parking_lot::Mutex<Vec<OptionQuery>>>,
    pub should_fail: bool,
}

impl MockOptionSource {
    pub fn new(options: Vec<OptionItem>) -> Self {
        Self {
            options,
            queries: Arc::new(parking_lot::Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn queries(&self) -> Vec<OptionQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl OptionSource for MockOptionSource {
    async fn fetch_options(&self, query: &OptionQuery) -> GridResult<Vec<OptionItem>> {
        self.queries.lock().push(query.clone());
        if self.should_fail {
            return Err(GridError::Fetch("option service offline".into()));
        }
        Ok(self
            .options
            .iter()
            .filter(|o| o.matches(&query.search_term))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}

/// Add-new handler echoing the typed text as the option
#[derive(Default)]
pub struct MockAddNew {
    pub created: Arc<parking_lot::Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl AddNewHandler for MockAddNew {
    async fn on_add_new(&self, column: &str, value: &str) -> GridResult<OptionItem> {
        self.created
            .lock()
            .push((column.to_string(), value.to_string()));
        Ok(OptionItem::new(value, value))
    }
}

/// Delivery trips: id, driver, status, stops, date
pub fn trip_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::integer("id", "ID").mandatory(),
        ColumnDescriptor::new("driver", "Driver", ColumnKind::EditableText)
            .required()
            .with_max_length(20),
        ColumnDescriptor::select(
            "status",
            "Status",
            vec![
                OptionItem::new("Planned", "planned"),
                OptionItem::new("Active", "active"),
                OptionItem::new("Done", "done"),
            ],
        )
        .editable(true)
        .groupable(),
        ColumnDescriptor::integer("stops", "Stops").editable(true),
        ColumnDescriptor::date("date", "Date"),
    ]
}

pub fn trip(id: i64, driver: &str, status: &str, stops: i64, date: &str) -> Row {
    Row::new()
        .with("id", id)
        .with("driver", driver)
        .with("status", status)
        .with("stops", stops)
        .with("date", date)
}

pub fn trip_rows() -> Vec<Row> {
    vec![
        trip(1, "Ana", "planned", 4, "2024-03-01"),
        trip(2, "Ben", "active", 7, "2024-03-02"),
        trip(3, "Cleo", "done", 2, "2024-02-28"),
        trip(4, "Dev", "active", 9, "2024-03-04"),
        trip(5, "Eli", "planned", 1, "2024-03-05"),
        trip(6, "Fay", "done", 5, "2024-03-01"),
        trip(7, "Gus", "active", 3, "2024-02-27"),
        trip(8, "Hana", "planned", 6, "2024-03-08"),
    ]
}

pub fn ids(values: &[i64]) -> Vec<RowId> {
    values.iter().map(|&v| RowId::from(v)).collect()
}
