//! Grid preference record and schema reconciliation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use smartgrid_core::{ColumnDescriptor, FilterCondition, SortState};

/// Current preferences version - increment when the record structure changes
pub const PREFERENCES_VERSION: u32 = 1;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Persisted per-grid preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridPreferences {
    /// Version for migration purposes
    pub version: u32,
    pub column_order: Vec<String>,
    pub hidden_columns: BTreeSet<String>,
    pub column_widths: BTreeMap<String, f32>,
    pub column_headers: BTreeMap<String, String>,
    pub active_filters: Vec<FilterCondition>,
    pub sort: Option<SortState>,
    pub page_size: usize,
    /// Nested column keys shown in sub-rows
    pub sub_row_columns: Vec<String>,
    /// Whether nested sub-rows can be expanded
    pub sub_rows_enabled: bool,
}

impl Default for GridPreferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            column_order: Vec::new(),
            hidden_columns: BTreeSet::new(),
            column_widths: BTreeMap::new(),
            column_headers: BTreeMap::new(),
            active_filters: Vec::new(),
            sort: None,
            page_size: DEFAULT_PAGE_SIZE,
            sub_row_columns: Vec::new(),
            sub_rows_enabled: true,
        }
    }
}

impl GridPreferences {
    /// Schema defaults: every column visible in declaration order
    pub fn defaults_for(columns: &[ColumnDescriptor], page_size: usize) -> Self {
        Self {
            column_order: columns.iter().map(|c| c.key.clone()).collect(),
            page_size: page_size.max(1),
            ..Self::default()
        }
    }

    /// Align stored preferences with the current schema.
    ///
    /// Unknown keys are dropped, new columns are appended once in schema
    /// order, and mandatory columns are never hidden.
    pub fn reconcile(mut self, columns: &[ColumnDescriptor]) -> Self {
        let known: HashSet<&str> = columns.iter().map(|c| c.key.as_str()).collect();

        let mut seen = HashSet::new();
        let mut order: Vec<String> = self
            .column_order
            .into_iter()
            .filter(|key| known.contains(key.as_str()) && seen.insert(key.clone()))
            .collect();
        for column in columns {
            if seen.insert(column.key.clone()) {
                order.push(column.key.clone());
            }
        }
        self.column_order = order;

        self.hidden_columns.retain(|key| {
            columns
                .iter()
                .any(|c| &c.key == key && !c.mandatory)
        });
        self.column_widths.retain(|key, _| known.contains(key.as_str()));
        self.column_headers.retain(|key, _| known.contains(key.as_str()));

        if let Some(sort) = &self.sort {
            let sortable = columns.iter().any(|c| c.key == sort.field && c.sortable);
            if !sortable {
                self.sort = None;
            }
        }

        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self.version = PREFERENCES_VERSION;
        self
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden_columns.contains(key)
    }

    /// Visible column keys in display order
    pub fn visible_columns(&self) -> Vec<&str> {
        self.column_order
            .iter()
            .filter(|key| !self.hidden_columns.contains(key.as_str()))
            .map(|key| key.as_str())
            .collect()
    }

    /// Header label, honoring overrides
    pub fn header_for<'a>(&'a self, column: &'a ColumnDescriptor) -> &'a str {
        self.column_headers
            .get(&column.key)
            .map(|s| s.as_str())
            .unwrap_or(column.label.as_str())
    }

    pub fn width_for(&self, column: &ColumnDescriptor) -> Option<f32> {
        self.column_widths.get(&column.key).copied().or(column.width)
    }
}
