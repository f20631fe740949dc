use super::*;

use crate::selection::SelectionMode;

impl SmartGrid {
    fn selection_changed(&mut self, changed: bool) -> bool {
        if changed {
            self.events
                .push(GridEvent::SelectionChanged(self.selection.selected_ids()));
        }
        changed
    }

    /// Drop selections whose rows left the dataset and report what changed
    pub(super) fn prune_selection(&mut self) {
        let existing = self.row_ids.iter().cloned().collect();
        let nested_before = self.selection.selected_nested().len();
        if self.selection.prune(&existing) {
            self.events
                .push(GridEvent::SelectionChanged(self.selection.selected_ids()));
            let nested = self.selection.selected_nested();
            if nested.len() != nested_before {
                self.events.push(GridEvent::NestedSelectionChanged(nested));
            }
        }
    }

    /// Flip the selection of a row. Returns whether it is selected now.
    pub fn toggle_row(&mut self, id: &RowId) -> bool {
        if self.selection.mode() == SelectionMode::None {
            return false;
        }
        let selected = self.selection.toggle(id);
        self.selection_changed(true);
        selected
    }

    /// Flip the selection of a nested row. Returns whether it is selected now.
    pub fn toggle_nested_row(&mut self, parent: &RowId, child: &RowId) -> bool {
        if self.selection.nested_mode() == SelectionMode::None {
            return false;
        }
        let selected = self.selection.toggle_nested(parent, child);
        self.events
            .push(GridEvent::NestedSelectionChanged(self.selection.selected_nested()));
        selected
    }

    /// Selected nested rows as (parent, child) pairs, in selection order
    pub fn selected_nested_rows(&self) -> Vec<(RowId, RowId)> {
        self.selection.selected_nested()
    }

    /// Select every processed row, across all pages
    pub fn select_all(&mut self) -> bool {
        let ids = self.processed_ids();
        let changed = self.selection.select_all(ids);
        self.selection_changed(changed)
    }

    pub fn clear_selection(&mut self) {
        let had_any = !self.selection.is_empty();
        self.selection.clear();
        self.selection_changed(had_any);
    }

    /// Drop the selection and seed the configured default again
    pub fn reset_selection(&mut self) {
        self.selection.reset();
        self.selection_changed(true);
    }

    pub fn selected_ids(&self) -> Vec<RowId> {
        self.selection.selected_ids()
    }

    /// Selected rows present in the dataset, in selection order
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.selection
            .selected_ids()
            .iter()
            .filter_map(|id| self.row(id))
            .collect()
    }

    pub fn is_row_selected(&self, id: &RowId) -> bool {
        self.selection.is_selected(id)
    }

    pub fn is_nested_row_selected(&self, parent: &RowId, child: &RowId) -> bool {
        self.selection.is_nested_selected(parent, child)
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    // Expansion

    pub fn is_expandable(&self, id: &RowId) -> bool {
        if !self.preferences.preferences().sub_rows_enabled {
            return false;
        }
        match (&self.expansion, self.row(id)) {
            (Some(expansion), Some(row)) => expansion.is_expandable(row),
            _ => false,
        }
    }

    pub fn is_expanded(&self, id: &RowId) -> bool {
        if !self.preferences.preferences().sub_rows_enabled {
            return false;
        }
        match (&self.expansion, self.row(id)) {
            (Some(expansion), Some(row)) => expansion.is_expanded(id, row),
            _ => false,
        }
    }

    /// Expand or collapse a row. Returns the new state.
    pub fn toggle_expanded(&mut self, id: &RowId) -> bool {
        if !self.preferences.preferences().sub_rows_enabled {
            return false;
        }
        let Some(index) = self.index_of(id) else {
            return false;
        };
        match &mut self.expansion {
            Some(expansion) => expansion.toggle(id, &self.rows[index]),
            None => false,
        }
    }

    pub fn collapse_all(&mut self) {
        if let Some(expansion) = &mut self.expansion {
            expansion.collapse_all();
        }
    }

    pub fn expand_all(&mut self) {
        if let Some(expansion) = &mut self.expansion {
            expansion.expand_all();
        }
    }

    /// Identities of the nested rows under `parent`
    pub fn nested_ids(&self, parent: &RowId) -> Vec<RowId> {
        let (Some(config), Some(row)) = (&self.sub_rows, self.row(parent)) else {
            return Vec::new();
        };
        row.nested(&config.key)
            .unwrap_or(&[])
            .iter()
            .enumerate()
            .map(|(i, child)| config.child_id(child, i))
            .collect()
    }
}
