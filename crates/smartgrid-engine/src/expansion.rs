//! Per-row expansion of nested sub-rows

use std::collections::HashMap;

use smartgrid_core::{Row, RowId};

#[derive(Debug, Clone)]
pub struct ExpansionManager {
    /// Field holding the nested rows
    key: String,
    default_expanded: bool,
    /// State of rows without an override
    baseline: bool,
    overrides: HashMap<RowId, bool>,
}

impl ExpansionManager {
    pub fn new(key: impl Into<String>, default_expanded: bool) -> Self {
        Self {
            key: key.into(),
            default_expanded,
            baseline: default_expanded,
            overrides: HashMap::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Only rows with a non-empty nested array can expand
    pub fn is_expandable(&self, row: &Row) -> bool {
        row.has_nested(&self.key)
    }

    pub fn is_expanded(&self, id: &RowId, row: &Row) -> bool {
        self.is_expandable(row) && self.overrides.get(id).copied().unwrap_or(self.baseline)
    }

    /// Flip one row. Returns the new state; rows that cannot expand stay collapsed.
    pub fn toggle(&mut self, id: &RowId, row: &Row) -> bool {
        if !self.is_expandable(row) {
            return false;
        }
        let expanded = !self.is_expanded(id, row);
        self.set(id, expanded);
        expanded
    }

    fn set(&mut self, id: &RowId, expanded: bool) {
        if expanded == self.baseline {
            self.overrides.remove(id);
        } else {
            self.overrides.insert(id.clone(), expanded);
        }
    }

    pub fn collapse_all(&mut self) {
        self.baseline = false;
        self.overrides.clear();
    }

    pub fn expand_all(&mut self) {
        self.baseline = true;
        self.overrides.clear();
    }

    /// Back to the configured default for every row
    pub fn reset(&mut self) {
        self.baseline = self.default_expanded;
        self.overrides.clear();
    }
}
