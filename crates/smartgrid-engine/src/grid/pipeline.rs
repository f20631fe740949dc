use super::*;

use crate::events::DataRequest;
use crate::filter::row_matches_filters;
use crate::group::{flatten_groups, group_rows};
use crate::logging::TimingGuard;

/// One row of the rendered page
#[derive(Debug, Clone, Copy)]
pub struct GridRow<'a> {
    pub id: &'a RowId,
    pub row: &'a Row,
    /// Position in the dataset
    pub index: usize,
}

impl SmartGrid {
    /// Rebuild the processed order and the page after a state change.
    ///
    /// Client mode filters, sorts, groups and slices in memory. Server mode
    /// treats `rows` as the already-processed page and only groups it.
    pub(super) fn recompute(&mut self) {
        let _timing = TimingGuard::new("smartgrid.recompute");

        let mut indices: Vec<usize> = match self.config.data_mode {
            DataMode::Client => {
                let applied = self.filter_panel.applied();
                (0..self.rows.len())
                    .filter(|&i| {
                        let row = &self.rows[i];
                        self.quick_filters.matches(row, &self.columns)
                            && row_matches_filters(row, applied)
                    })
                    .collect()
            }
            DataMode::Server => (0..self.rows.len()).collect(),
        };

        if self.config.data_mode == DataMode::Client {
            self.sort.apply(&self.rows, &self.columns, &mut indices);
        }

        let groups = match self.group_by.as_deref().and_then(|key| self.column(key)) {
            Some(column) => group_rows(&self.rows, &indices, column),
            None => Vec::new(),
        };
        self.groups = groups;
        if !self.groups.is_empty() {
            indices = flatten_groups(&self.groups);
        }
        self.processed = indices;

        match self.config.data_mode {
            DataMode::Client => {
                let total = self.processed.len();
                self.pagination.update_after_load(0, Some(total));
                self.page = self.pagination.page_range(total);
                self.pagination.records_in_current_page = self.page.len();
            }
            DataMode::Server => {
                self.page = 0..self.processed.len();
                self.pagination
                    .update_after_load(self.processed.len(), self.server_total);
            }
        }

        tracing::debug!(
            rows = self.rows.len(),
            processed = self.processed.len(),
            groups = self.groups.len(),
            page = self.pagination.current_page,
            "Recomputed grid view"
        );
    }

    /// Recompute locally, and in server mode ask the host for fresh rows
    pub(super) fn refresh(&mut self) {
        if self.config.data_mode == DataMode::Server {
            let request = self.data_request();
            tracing::debug!(page = request.page, offset = request.offset, "Requesting server data");
            self.events.push(GridEvent::DataRequested(request));
        }
        self.recompute();
    }

    /// What the host must fetch in server mode
    pub fn data_request(&self) -> DataRequest {
        DataRequest {
            filters: self.filter_panel.applied().to_vec(),
            quick_filters: self
                .quick_filters
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            sort: self.sort.state().cloned(),
            page: self.pagination.current_page,
            page_size: self.pagination.records_per_page,
            offset: self.pagination.offset(),
        }
    }

    /// Rows of the current page, in display order
    pub fn visible_rows(&self) -> Vec<GridRow<'_>> {
        self.processed[self.page.clone()]
            .iter()
            .map(|&index| GridRow {
                id: &self.row_ids[index],
                row: &self.rows[index],
                index,
            })
            .collect()
    }

    pub fn visible_ids(&self) -> Vec<RowId> {
        self.processed[self.page.clone()]
            .iter()
            .map(|&i| self.row_ids[i].clone())
            .collect()
    }

    /// Every row passing the filters, in processed order, across all pages
    pub fn processed_rows(&self) -> Vec<&Row> {
        self.processed.iter().map(|&i| &self.rows[i]).collect()
    }

    pub fn processed_ids(&self) -> Vec<RowId> {
        self.processed.iter().map(|&i| self.row_ids[i].clone()).collect()
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Total matching rows, as reported by the host in server mode
    pub fn total_count(&self) -> usize {
        match self.config.data_mode {
            DataMode::Client => self.processed.len(),
            DataMode::Server => self.server_total.unwrap_or(self.rows.len()),
        }
    }

    /// Groups over all processed rows
    pub fn groups(&self) -> &[RowGroup] {
        &self.groups
    }

    /// Groups restricted to the rows of the current page
    pub fn visible_groups(&self) -> Vec<RowGroup> {
        let on_page: std::collections::HashSet<usize> =
            self.processed[self.page.clone()].iter().copied().collect();
        self.groups
            .iter()
            .filter_map(|group| {
                let indices: Vec<usize> = group
                    .indices
                    .iter()
                    .copied()
                    .filter(|i| on_page.contains(i))
                    .collect();
                (!indices.is_empty()).then(|| RowGroup {
                    label: group.label.clone(),
                    indices,
                })
            })
            .collect()
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }
}
