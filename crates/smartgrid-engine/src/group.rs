//! Grouping of processed rows by one column

use indexmap::IndexMap;
use serde::Serialize;

use smartgrid_core::{ColumnDescriptor, Row};

/// One group of rows sharing a display value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowGroup {
    /// Display text of the shared value; empty for blank cells
    pub label: String,
    /// Positions into the dataset, in input order
    pub indices: Vec<usize>,
}

impl RowGroup {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Partition `indices` by the display value of `column`.
///
/// Groups come out in order of first appearance, rows keep their input
/// order within a group.
pub fn group_rows(rows: &[Row], indices: &[usize], column: &ColumnDescriptor) -> Vec<RowGroup> {
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for &index in indices {
        let label = column.display(rows[index].value(&column.key));
        groups.entry(label).or_default().push(index);
    }
    groups
        .into_iter()
        .map(|(label, indices)| RowGroup { label, indices })
        .collect()
}

/// Row positions in group order
pub fn flatten_groups(groups: &[RowGroup]) -> Vec<usize> {
    groups
        .iter()
        .flat_map(|g| g.indices.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use smartgrid_core::{OptionItem, Value};
    use std::collections::HashSet;

    fn rows() -> Vec<Row> {
        ["north", "south", "north", "", "east", "south", "north"]
            .iter()
            .enumerate()
            .map(|(i, region)| Row::new().with("id", i as i64).with("region", *region))
            .collect()
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let rows = rows();
        let indices: Vec<usize> = (0..rows.len()).collect();
        let groups = group_rows(&rows, &indices, &ColumnDescriptor::text("region", "Region"));

        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["north", "south", "", "east"]);
        assert_eq!(groups[0].indices, vec![0, 2, 6]);
    }

    #[test]
    fn test_every_row_in_exactly_one_group() {
        let rows = rows();
        let indices: Vec<usize> = vec![6, 5, 4, 3, 2, 1, 0];
        let groups = group_rows(&rows, &indices, &ColumnDescriptor::text("region", "Region"));

        let total: usize = groups.iter().map(RowGroup::len).sum();
        assert_eq!(total, rows.len());

        let flat = flatten_groups(&groups);
        let unique: HashSet<usize> = flat.iter().copied().collect();
        assert_eq!(unique.len(), rows.len());
        // Input order preserved inside a group
        assert_eq!(groups[0].indices, vec![6, 2, 0]);
    }

    #[test]
    fn test_groups_use_option_labels() {
        let rows = vec![
            Row::new().with("status", "o"),
            Row::new().with("status", Value::from("c")),
        ];
        let column = ColumnDescriptor::select(
            "status",
            "Status",
            vec![OptionItem::new("Open", "o"), OptionItem::new("Closed", "c")],
        );
        let groups = group_rows(&rows, &[0, 1], &column);
        assert_eq!(groups[1].label, "Closed");
    }
}
