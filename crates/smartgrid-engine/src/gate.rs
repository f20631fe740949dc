//! Duplicate-submission gate for asynchronous actions

use std::collections::HashSet;

use smartgrid_core::{GridError, GridResult};

/// Logical actions that may be pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridAction {
    LoadPreferences,
    LoadFilterSets,
    SaveFilterSet,
    UpdateFilterSet,
    DeleteFilterSet,
    AddRow,
    EditRow,
    DeleteRow,
    CommitCell,
    AddOption,
    SubmitForm,
}

impl GridAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LoadPreferences => "load preferences",
            Self::LoadFilterSets => "load filter sets",
            Self::SaveFilterSet => "save filter set",
            Self::UpdateFilterSet => "update filter set",
            Self::DeleteFilterSet => "delete filter set",
            Self::AddRow => "add row",
            Self::EditRow => "edit row",
            Self::DeleteRow => "delete row",
            Self::CommitCell => "commit cell",
            Self::AddOption => "add option",
            Self::SubmitForm => "submit form",
        }
    }
}

/// Tracks which actions are in flight
#[derive(Debug, Default)]
pub struct LoadingGate {
    pending: HashSet<GridAction>,
}

impl LoadingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `action` pending, or fail with `Busy` if it already is
    pub fn try_begin(&mut self, action: GridAction) -> GridResult<()> {
        if !self.pending.insert(action) {
            tracing::debug!(action = action.label(), "Rejected duplicate submission");
            return Err(GridError::Busy(action.label().to_string()));
        }
        Ok(())
    }

    pub fn finish(&mut self, action: GridAction) {
        self.pending.remove(&action);
    }

    pub fn is_loading(&self, action: GridAction) -> bool {
        self.pending.contains(&action)
    }

    pub fn any_loading(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_begin_is_busy() {
        let mut gate = LoadingGate::new();
        gate.try_begin(GridAction::SaveFilterSet).unwrap();
        assert!(gate.is_loading(GridAction::SaveFilterSet));
        assert!(matches!(
            gate.try_begin(GridAction::SaveFilterSet),
            Err(GridError::Busy(_))
        ));

        // Other actions are independent
        assert!(gate.try_begin(GridAction::AddRow).is_ok());

        gate.finish(GridAction::SaveFilterSet);
        assert!(gate.try_begin(GridAction::SaveFilterSet).is_ok());
    }
}
