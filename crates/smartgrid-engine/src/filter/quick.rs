//! Per-column quick filters
//!
//! A quick filter is a case-insensitive "contains" on the text a column
//! displays for a cell, so select columns match on option labels.

use indexmap::IndexMap;

use smartgrid_core::{ColumnDescriptor, Row};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickFilters {
    /// Column key to lowercased needle
    terms: IndexMap<String, String>,
}

impl QuickFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quick filter for a column. Blank text removes it.
    pub fn set(&mut self, key: &str, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.terms.shift_remove(key).is_some();
        }
        self.terms.insert(key.to_string(), needle.clone()) != Some(needle)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.terms.get(key).map(|s| s.as_str())
    }

    pub fn clear(&mut self) -> bool {
        let had_any = !self.terms.is_empty();
        self.terms.clear();
        had_any
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn matches(&self, row: &Row, columns: &[ColumnDescriptor]) -> bool {
        self.terms.iter().all(|(key, needle)| {
            let value = row.value(key);
            let text = match columns.iter().find(|c| &c.key == key) {
                Some(column) => column.display(value),
                None => value.to_string(),
            };
            text.to_lowercase().contains(needle.as_str())
        })
    }
}
