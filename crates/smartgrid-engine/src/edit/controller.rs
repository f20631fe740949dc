//! Inline cell editing
//!
//! `CellEditController` tracks the one cell being edited. The apply
//! functions write a normalized value into a row, clear the columns that
//! depend on it and recompute derived fields.

use std::collections::HashSet;

use smartgrid_core::{
    ColumnDescriptor, EditorKind, GridError, GridResult, Row, RowId, Value,
};

use super::subrow::SubRowConfig;

/// A nested cell: the row under `section` with identity `child`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NestedAddress {
    pub section: String,
    pub child: RowId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// Top-level row
    pub row: RowId,
    pub column: String,
    pub nested: Option<NestedAddress>,
}

impl CellAddress {
    pub fn new(row: RowId, column: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
            nested: None,
        }
    }

    pub fn nested(row: RowId, section: impl Into<String>, child: RowId, column: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
            nested: Some(NestedAddress {
                section: section.into(),
                child,
            }),
        }
    }
}

/// The cell currently being edited
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdit {
    pub address: CellAddress,
    pub editor: EditorKind,
    pub original: Value,
    pub draft: Value,
}

#[derive(Debug, Default)]
pub struct CellEditController {
    editing: Option<CellEdit>,
}

impl CellEditController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing a cell. Any edit in progress is discarded.
    pub fn begin(
        &mut self,
        address: CellAddress,
        column: &ColumnDescriptor,
        current: &Value,
    ) -> GridResult<EditorKind> {
        let editor = column.editor();
        if editor == EditorKind::ReadOnly {
            return Err(GridError::NotEditable(column.key.clone()));
        }
        if let Some(previous) = self.editing.take() {
            tracing::debug!(column = %previous.address.column, "Discarding unfinished edit");
        }
        self.editing = Some(CellEdit {
            address,
            editor,
            original: current.clone(),
            draft: current.clone(),
        });
        Ok(editor)
    }

    pub fn editing(&self) -> Option<&CellEdit> {
        self.editing.as_ref()
    }

    pub fn is_editing(&self, address: &CellAddress) -> bool {
        self.editing.as_ref().is_some_and(|e| &e.address == address)
    }

    pub fn set_draft(&mut self, value: Value) -> GridResult<()> {
        let edit = self
            .editing
            .as_mut()
            .ok_or_else(|| GridError::NotFound("no cell is being edited".into()))?;
        edit.draft = value;
        Ok(())
    }

    /// Add a value to a multi-select draft, or replace a single draft
    pub fn push_draft(&mut self, value: Value) -> GridResult<()> {
        let edit = self
            .editing
            .as_mut()
            .ok_or_else(|| GridError::NotFound("no cell is being edited".into()))?;
        edit.draft = match (edit.editor, std::mem::take(&mut edit.draft)) {
            (EditorKind::MultiDropdown | EditorKind::LazyMultiDropdown, Value::Array(mut items)) => {
                if !items.contains(&value) {
                    items.push(value);
                }
                Value::Array(items)
            }
            (EditorKind::MultiDropdown | EditorKind::LazyMultiDropdown, _) => Value::Array(vec![value]),
            _ => value,
        };
        Ok(())
    }

    pub fn cancel(&mut self) -> Option<CellEdit> {
        self.editing.take()
    }

    /// Take the edit for committing
    pub fn finish(&mut self) -> Option<CellEdit> {
        self.editing.take()
    }
}

/// Columns depending on `changed`, directly or through other dependents
pub fn dependents_of(columns: &[ColumnDescriptor], changed: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([changed]);
    let mut queue = vec![changed];
    while let Some(field) = queue.pop() {
        for column in columns {
            if column.depends_on.iter().any(|d| d == field) && seen.insert(&column.key) {
                found.push(column.key.clone());
                queue.push(&column.key);
            }
        }
    }
    found
}

/// Reset every dependent of `changed` to its empty value
pub fn clear_dependents(row: &mut Row, columns: &[ColumnDescriptor], changed: &str) -> Vec<String> {
    let cleared = dependents_of(columns, changed);
    for key in &cleared {
        let empty = columns
            .iter()
            .find(|c| &c.key == key)
            .and_then(|c| c.kind.normalize(Value::Null).ok())
            .unwrap_or_default();
        row.set(key.clone(), empty);
    }
    if !cleared.is_empty() {
        tracing::debug!(changed, cleared = ?cleared, "Cleared dependent fields");
    }
    cleared
}

/// Write `raw` into `row[key]`, normalized by the column's kind.
///
/// Returns the dependents that were cleared.
pub fn apply_edit(
    row: &mut Row,
    columns: &[ColumnDescriptor],
    key: &str,
    raw: Value,
) -> GridResult<Vec<String>> {
    let column = columns
        .iter()
        .find(|c| c.key == key)
        .ok_or_else(|| GridError::NotFound(format!("column '{}'", key)))?;
    let value = column.kind.normalize(raw)?;
    let changed = row.value(key) != &value;
    row.set(key, value);
    if changed {
        Ok(clear_dependents(row, columns, key))
    } else {
        Ok(Vec::new())
    }
}

/// Edit a nested cell, then recompute the nested row's derived fields and
/// the parent's aggregates.
pub fn apply_nested_edit(
    parent: &mut Row,
    config: &SubRowConfig,
    child: &RowId,
    key: &str,
    raw: Value,
) -> GridResult<Vec<String>> {
    let index = config
        .child_index(parent, child)
        .ok_or_else(|| GridError::NotFound(format!("nested row '{}'", child)))?;
    let children = parent
        .nested_mut(&config.key)
        .ok_or_else(|| GridError::NotFound(format!("nested section '{}'", config.key)))?;
    let target = children
        .get_mut(index)
        .ok_or_else(|| GridError::NotFound(format!("nested row '{}'", child)))?;

    let cleared = apply_edit(target, &config.columns, key, raw)?;
    config.recompute_child(target);
    config.recompute_parent(parent);
    Ok(cleared)
}
