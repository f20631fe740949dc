//! Row selection keyed by stable row identity
//!
//! Top-level rows and nested rows are selected independently. Nested rows
//! are addressed by a (parent id, child id) pair.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use smartgrid_core::RowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    #[default]
    None,
    Single,
    Multi,
}

/// How far a nested multi-selection may reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedScope {
    /// Selected nested rows all belong to one parent
    WithinParent,
    #[default]
    Global,
}

/// Rows selected when the grid mounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultSelection {
    Ids(Vec<RowId>),
    /// Positions in the dataset as supplied
    Indices(Vec<usize>),
}

#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    mode: SelectionMode,
    nested_mode: SelectionMode,
    nested_scope: NestedScope,
    selected: IndexSet<RowId>,
    nested: IndexSet<(RowId, RowId)>,
    default_selection: Option<DefaultSelection>,
    default_ids: Vec<RowId>,
    seeded: bool,
}

impl SelectionManager {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn with_nested(mut self, mode: SelectionMode, scope: NestedScope) -> Self {
        self.nested_mode = mode;
        self.nested_scope = scope;
        self
    }

    pub fn with_default(mut self, default_selection: DefaultSelection) -> Self {
        self.default_selection = Some(default_selection);
        self
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn nested_mode(&self) -> SelectionMode {
        self.nested_mode
    }

    /// Apply the default selection once. `dataset_ids` are the ids of the
    /// dataset rows in the order they were supplied.
    pub fn seed_default(&mut self, dataset_ids: &[RowId]) {
        if self.seeded {
            return;
        }
        self.seeded = true;
        self.default_ids = match &self.default_selection {
            None => Vec::new(),
            Some(DefaultSelection::Ids(ids)) => ids.clone(),
            Some(DefaultSelection::Indices(indices)) => indices
                .iter()
                .filter_map(|&i| {
                    let id = dataset_ids.get(i).cloned();
                    if id.is_none() {
                        tracing::warn!(index = i, "Default selection index out of range");
                    }
                    id
                })
                .collect(),
        };
        self.apply_default();
    }

    fn apply_default(&mut self) {
        let ids = match self.mode {
            SelectionMode::None => &[][..],
            SelectionMode::Single => &self.default_ids[..self.default_ids.len().min(1)],
            SelectionMode::Multi => &self.default_ids[..],
        };
        self.selected = ids.iter().cloned().collect();
    }

    /// Clear everything and re-apply the default selection
    pub fn reset(&mut self) {
        self.nested.clear();
        self.apply_default();
    }

    /// Forget the seeded default, as on unmount
    pub fn unmount(&mut self) {
        self.selected.clear();
        self.nested.clear();
        self.default_ids.clear();
        self.seeded = false;
    }

    /// Flip a top-level row. Returns whether the row is now selected.
    pub fn toggle(&mut self, id: &RowId) -> bool {
        match self.mode {
            SelectionMode::None => false,
            SelectionMode::Single => {
                if self.selected.contains(id) {
                    self.selected.clear();
                    false
                } else {
                    self.selected.clear();
                    self.selected.insert(id.clone());
                    true
                }
            }
            SelectionMode::Multi => {
                if self.selected.shift_remove(id) {
                    false
                } else {
                    self.selected.insert(id.clone());
                    true
                }
            }
        }
    }

    /// Flip a nested row. Returns whether it is now selected.
    pub fn toggle_nested(&mut self, parent: &RowId, child: &RowId) -> bool {
        let key = (parent.clone(), child.clone());
        if self.nested.shift_remove(&key) {
            return false;
        }
        match self.nested_mode {
            SelectionMode::None => return false,
            // One nested row across all parents
            SelectionMode::Single => self.nested.clear(),
            SelectionMode::Multi => {
                if self.nested_scope == NestedScope::WithinParent {
                    self.nested.retain(|(p, _)| p == parent);
                }
            }
        }
        self.nested.insert(key);
        true
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.nested.clear();
    }

    /// Select every given row. Multi mode only.
    pub fn select_all(&mut self, ids: impl IntoIterator<Item = RowId>) -> bool {
        if self.mode != SelectionMode::Multi {
            return false;
        }
        self.selected.extend(ids);
        true
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    pub fn is_nested_selected(&self, parent: &RowId, child: &RowId) -> bool {
        self.nested.contains(&(parent.clone(), child.clone()))
    }

    /// Selected top-level ids in selection order
    pub fn selected_ids(&self) -> Vec<RowId> {
        self.selected.iter().cloned().collect()
    }

    pub fn selected_nested(&self) -> Vec<(RowId, RowId)> {
        self.nested.iter().cloned().collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.nested.is_empty()
    }

    /// Drop ids whose rows left the dataset. Returns whether anything changed.
    pub fn prune(&mut self, existing: &HashSet<RowId>) -> bool {
        let before = self.selected.len() + self.nested.len();
        self.selected.retain(|id| existing.contains(id));
        self.nested.retain(|(parent, _)| existing.contains(parent));
        before != self.selected.len() + self.nested.len()
    }
}
