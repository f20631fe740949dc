//! Collaborator contracts attached to columns and grids

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::GridResult;
use crate::types::{Row, RowId, Value};

/// One selectable option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    pub label: String,
    pub value: Value,
}

impl OptionItem {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive match of `term` against label or value
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.label.to_lowercase().contains(&term) || self.value.search_text().contains(&term)
    }
}

/// Page request for lazily-loaded options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionQuery {
    pub search_term: String,
    /// Number of matches to skip
    pub offset: usize,
    pub limit: usize,
    /// Row being edited, for options scoped by sibling values
    pub row: Option<Row>,
}

impl OptionQuery {
    pub fn new(search_term: impl Into<String>, offset: usize, limit: usize) -> Self {
        Self {
            search_term: search_term.into(),
            offset,
            limit,
            row: None,
        }
    }

    pub fn with_row(mut self, row: Row) -> Self {
        self.row = Some(row);
        self
    }
}

/// Asynchronous option provider
#[async_trait]
pub trait OptionSource: Send + Sync {
    async fn fetch_options(&self, query: &OptionQuery) -> GridResult<Vec<OptionItem>>;
}

fn page(items: impl Iterator<Item = OptionItem>, query: &OptionQuery) -> Vec<OptionItem> {
    items
        .filter(|item| item.matches(&query.search_term))
        .skip(query.offset)
        .take(query.limit)
        .collect()
}

/// In-memory option source that pages through a fixed list
#[derive(Debug, Clone, Default)]
pub struct StaticOptionSource {
    options: Vec<OptionItem>,
}

impl StaticOptionSource {
    pub fn new(options: Vec<OptionItem>) -> Self {
        Self { options }
    }
}

#[async_trait]
impl OptionSource for StaticOptionSource {
    async fn fetch_options(&self, query: &OptionQuery) -> GridResult<Vec<OptionItem>> {
        Ok(page(self.options.iter().cloned(), query))
    }
}

/// Options keyed by the value of a parent field in the edited row
#[derive(Debug, Clone)]
pub struct CascadingOptionSource {
    parent_field: String,
    options: IndexMap<String, Vec<OptionItem>>,
}

impl CascadingOptionSource {
    pub fn new(parent_field: impl Into<String>) -> Self {
        Self {
            parent_field: parent_field.into(),
            options: IndexMap::new(),
        }
    }

    pub fn with_options(mut self, parent_value: impl Into<String>, options: Vec<OptionItem>) -> Self {
        self.options.insert(parent_value.into(), options);
        self
    }

    pub fn parent_field(&self) -> &str {
        &self.parent_field
    }
}

#[async_trait]
impl OptionSource for CascadingOptionSource {
    async fn fetch_options(&self, query: &OptionQuery) -> GridResult<Vec<OptionItem>> {
        let parent_value = query
            .row
            .as_ref()
            .map(|row| row.value(&self.parent_field).to_string())
            .unwrap_or_default();

        // No parent chosen yet: nothing to offer
        let Some(options) = self.options.get(&parent_value) else {
            return Ok(Vec::new());
        };
        Ok(page(options.iter().cloned(), query))
    }
}

/// Creates a new option from free text typed in a select editor
#[async_trait]
pub trait AddNewHandler: Send + Sync {
    async fn on_add_new(&self, column: &str, value: &str) -> GridResult<OptionItem>;
}

/// Persists row additions, edits and deletions
#[async_trait]
pub trait RowMutationHandler: Send + Sync {
    /// Returns the stored row, which may carry a server-assigned key
    async fn on_add_row(&self, row: &Row) -> GridResult<Row>;

    async fn on_edit_row(&self, id: &RowId, row: &Row) -> GridResult<()>;

    async fn on_delete_row(&self, id: &RowId, row: &Row) -> GridResult<()>;
}
