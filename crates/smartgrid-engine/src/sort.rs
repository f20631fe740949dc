//! Single-column sorting with null handling
//!
//! Descending order is produced by reversing the stable ascending order, so
//! it is always the exact reverse of ascending, ties included.

use std::cmp::Ordering;

use smartgrid_core::{
    ColumnDescriptor, ColumnKind, NullPosition, Row, SortDirection, SortState, Value,
};

/// Compare two cells of a column of the given kind
pub fn compare_cells(kind: ColumnKind, a: &Value, b: &Value, nulls: NullPosition) -> Ordering {
    if a.is_null() || b.is_null() {
        return a.compare(b, nulls);
    }
    match kind {
        ColumnKind::Date => match (a.as_date(), b.as_date()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.compare(b, nulls),
        },
        ColumnKind::Integer => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => a.compare(b, nulls),
        },
        // Ranges sort by their start date
        ColumnKind::DateRange => {
            let start = |v: &Value| v.as_array().and_then(|items| items.first()).and_then(Value::as_date);
            match (start(a), start(b)) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => a.compare(b, nulls),
            }
        }
        _ => a.compare(b, nulls),
    }
}

/// The active sort of a grid. At most one sort is active at a time.
#[derive(Debug, Clone, Default)]
pub struct SortController {
    state: Option<SortState>,
    null_position: NullPosition,
}

impl SortController {
    pub fn new(null_position: NullPosition) -> Self {
        Self {
            state: None,
            null_position,
        }
    }

    pub fn state(&self) -> Option<&SortState> {
        self.state.as_ref()
    }

    pub fn null_position(&self) -> NullPosition {
        self.null_position
    }

    pub fn set_null_position(&mut self, position: NullPosition) {
        self.null_position = position;
    }

    /// Replace the active sort
    pub fn set(&mut self, state: Option<SortState>) {
        self.state = state;
    }

    /// Sort by `field`, replacing any prior sort
    pub fn sort_by(&mut self, field: &str, direction: SortDirection) {
        self.state = Some(SortState {
            field: field.to_string(),
            direction,
        });
    }

    /// Cycle a column header: none, ascending, descending, none.
    ///
    /// Clicking a different column starts it ascending.
    pub fn toggle(&mut self, field: &str) -> Option<&SortState> {
        self.state = match self.state.take() {
            Some(current) if current.field == field => match current.direction {
                SortDirection::Ascending => Some(SortState::descending(field)),
                SortDirection::Descending => None,
            },
            _ => Some(SortState::ascending(field)),
        };
        self.state.as_ref()
    }

    pub fn clear(&mut self) {
        self.state = None;
    }

    /// Reorder `indices` (positions into `rows`) by the active sort
    pub fn apply(&self, rows: &[Row], columns: &[ColumnDescriptor], indices: &mut [usize]) {
        let Some(state) = &self.state else {
            return;
        };
        let kind = columns
            .iter()
            .find(|c| c.key == state.field)
            .map(|c| c.kind)
            .unwrap_or_default();
        let nulls = self.null_position;

        // Stable sort keeps the input order between equal values
        indices.sort_by(|&a, &b| {
            compare_cells(
                kind,
                rows[a].value(&state.field),
                rows[b].value(&state.field),
                nulls,
            )
        });
        if state.direction == SortDirection::Descending {
            indices.reverse();
        }
    }
}
