//! Pagination state
//!
//! Page-based mode slices one page at a time. Infinite-scroll mode keeps a
//! growing window starting at the first record, extended by `load_more`.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Pagination display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Traditional page-based pagination with page numbers
    #[default]
    PageBased,
    /// Infinite scroll - loads more data as user scrolls
    InfiniteScroll,
}

impl PaginationMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PageBased => "Page Based",
            Self::InfiniteScroll => "Infinite Scroll",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::PageBased, Self::InfiniteScroll]
    }
}

pub const DEFAULT_PAGE_SIZES: &[usize] = &[10, 25, 50, 100];

/// Pagination state for one grid
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Current page number (1-indexed)
    pub current_page: usize,
    /// Records per page
    pub records_per_page: usize,
    /// Total records after filtering, when known
    pub total_records: Option<usize>,
    /// Number of records shown on the current page or window
    pub records_in_current_page: usize,
    /// Whether more records are available when the total is unknown
    pub has_more: bool,
    pub pagination_mode: PaginationMode,
    /// Records in the infinite-scroll window
    pub loaded_records: usize,
    pub available_page_sizes: Vec<usize>,
}

impl PaginationState {
    pub fn new(records_per_page: usize, mode: PaginationMode) -> Self {
        let records_per_page = records_per_page.max(1);
        Self {
            current_page: 1,
            records_per_page,
            total_records: None,
            records_in_current_page: 0,
            has_more: false,
            pagination_mode: mode,
            loaded_records: records_per_page,
            available_page_sizes: DEFAULT_PAGE_SIZES.to_vec(),
        }
    }

    pub fn with_page_sizes(mut self, sizes: Vec<usize>) -> Self {
        if !sizes.is_empty() {
            self.available_page_sizes = sizes;
        }
        if !self.available_page_sizes.contains(&self.records_per_page) {
            self.available_page_sizes.push(self.records_per_page);
            self.available_page_sizes.sort_unstable();
        }
        self
    }

    /// Calculate total number of pages
    pub fn total_pages(&self) -> Option<usize> {
        self.total_records
            .map(|total| total.div_ceil(self.records_per_page).max(1))
    }

    /// Offset of the first record on the current page
    pub fn offset(&self) -> usize {
        match self.pagination_mode {
            PaginationMode::PageBased => (self.current_page - 1) * self.records_per_page,
            PaginationMode::InfiniteScroll => 0,
        }
    }

    /// Records requested for the current page or window
    pub fn limit(&self) -> usize {
        match self.pagination_mode {
            PaginationMode::PageBased => self.records_per_page,
            PaginationMode::InfiniteScroll => self.loaded_records,
        }
    }

    /// Range of the current page within `len` processed records
    pub fn page_range(&self, len: usize) -> Range<usize> {
        let start = self.offset().min(len);
        let end = start.saturating_add(self.limit()).min(len);
        start..end
    }

    pub fn can_go_next(&self) -> bool {
        if let Some(total_pages) = self.total_pages() {
            self.current_page < total_pages
        } else {
            self.has_more
        }
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn go_next(&mut self) -> bool {
        if self.can_go_next() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    pub fn go_prev(&mut self) -> bool {
        if self.can_go_prev() {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    pub fn go_first(&mut self) -> bool {
        if self.current_page != 1 {
            self.current_page = 1;
            true
        } else {
            false
        }
    }

    /// Navigate to the last page. Does nothing while the total is unknown.
    pub fn go_last(&mut self) -> bool {
        match self.total_pages() {
            Some(last) if self.current_page != last => {
                self.current_page = last;
                true
            }
            _ => false,
        }
    }

    /// Navigate to a page, clamped to the known page range
    pub fn go_to_page(&mut self, page: usize) -> bool {
        let max_page = self.total_pages().unwrap_or(usize::MAX);
        let new_page = page.clamp(1, max_page);
        if self.current_page != new_page {
            self.current_page = new_page;
            true
        } else {
            false
        }
    }

    /// Set records per page. Resets to the first page.
    pub fn set_limit(&mut self, limit: usize) -> bool {
        if limit == 0 || self.records_per_page == limit {
            return false;
        }
        self.records_per_page = limit;
        self.reset();
        true
    }

    /// Switch modes. Resets to the first page.
    pub fn set_mode(&mut self, mode: PaginationMode) -> bool {
        if self.pagination_mode == mode {
            return false;
        }
        self.pagination_mode = mode;
        self.reset();
        true
    }

    /// Back to the first page and the initial window
    pub fn reset(&mut self) {
        self.current_page = 1;
        self.loaded_records = self.records_per_page;
    }

    /// Grow the infinite-scroll window by one page
    pub fn load_more(&mut self) -> bool {
        if self.pagination_mode != PaginationMode::InfiniteScroll {
            return false;
        }
        let more_available = match self.total_records {
            Some(total) => self.loaded_records < total,
            None => self.has_more,
        };
        if !more_available {
            return false;
        }
        self.loaded_records += self.records_per_page;
        true
    }

    /// Record the outcome of a recompute or a server load.
    ///
    /// The current page is clamped when the total shrank below it.
    pub fn update_after_load(&mut self, records_loaded: usize, total_records: Option<usize>) {
        self.records_in_current_page = records_loaded;
        self.total_records = total_records;

        // Determine if there are more pages based on loaded count
        if total_records.is_none() {
            self.has_more = records_loaded >= self.limit();
        }
        if let Some(last) = self.total_pages() {
            self.current_page = self.current_page.min(last);
        }
    }

    /// Status text, e.g. "25 records in page 1 of 4 (100 total)"
    pub fn status_text(&self) -> String {
        match self.pagination_mode {
            PaginationMode::PageBased => {
                if let Some(total) = self.total_records {
                    format!(
                        "{} records in page {} of {} ({} total)",
                        self.records_in_current_page,
                        self.current_page,
                        self.total_pages().unwrap_or(1),
                        total
                    )
                } else {
                    format!(
                        "{} records in page {}",
                        self.records_in_current_page, self.current_page
                    )
                }
            }
            PaginationMode::InfiniteScroll => {
                if let Some(total) = self.total_records {
                    format!(
                        "{} records loaded ({} total)",
                        self.records_in_current_page, total
                    )
                } else {
                    format!("{} records loaded", self.records_in_current_page)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paged(total: usize) -> PaginationState {
        let mut state = PaginationState::new(25, PaginationMode::PageBased);
        state.update_after_load(25.min(total), Some(total));
        state
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(paged(0).total_pages(), Some(1));
        assert_eq!(paged(25).total_pages(), Some(1));
        assert_eq!(paged(26).total_pages(), Some(2));
        assert_eq!(paged(100).total_pages(), Some(4));
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut state = paged(60);
        assert!(!state.go_prev());
        assert!(state.go_next());
        assert!(state.go_next());
        assert!(!state.go_next());
        assert_eq!(state.current_page, 3);
        assert_eq!(state.page_range(60), 50..60);

        assert!(state.go_first());
        assert!(state.go_to_page(99));
        assert_eq!(state.current_page, 3);
        assert!(state.go_to_page(0));
        assert_eq!(state.current_page, 1);
        assert!(state.go_last());
        assert_eq!(state.current_page, 3);
    }

    #[test]
    fn test_set_limit_resets_page() {
        let mut state = paged(100);
        state.go_to_page(3);
        assert!(state.set_limit(50));
        assert_eq!(state.current_page, 1);
        assert!(!state.set_limit(0));
    }

    #[test]
    fn test_shrinking_total_clamps_page() {
        let mut state = paged(100);
        state.go_to_page(4);
        state.update_after_load(5, Some(30));
        assert_eq!(state.current_page, 2);
    }

    #[test]
    fn test_infinite_scroll_window() {
        let mut state = PaginationState::new(10, PaginationMode::InfiniteScroll);
        state.update_after_load(10, Some(25));
        assert_eq!(state.page_range(25), 0..10);

        assert!(state.load_more());
        assert!(state.load_more());
        assert!(!state.load_more());
        assert_eq!(state.page_range(25), 0..25);
        assert_eq!(state.status_text(), "10 records loaded (25 total)");
    }

    #[test]
    fn test_unknown_total_uses_has_more() {
        let mut state = PaginationState::new(10, PaginationMode::PageBased);
        state.update_after_load(10, None);
        assert!(state.can_go_next());
        assert!(!state.go_last());
        state.update_after_load(3, None);
        assert!(!state.can_go_next());
    }

    #[test]
    fn test_status_text() {
        assert_eq!(paged(100).status_text(), "25 records in page 1 of 4 (100 total)");
    }

    #[test]
    fn test_page_sizes_include_current() {
        let state = PaginationState::new(30, PaginationMode::PageBased).with_page_sizes(vec![]);
        assert_eq!(state.available_page_sizes, vec![10, 25, 30, 50, 100]);
    }
}
