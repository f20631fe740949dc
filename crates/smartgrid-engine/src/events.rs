//! Events emitted by a grid for its host

use smartgrid_core::{FilterCondition, RowId, SortState};

/// What a server-mode host must fetch
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub filters: Vec<FilterCondition>,
    pub quick_filters: Vec<(String, String)>,
    pub sort: Option<SortState>,
    /// 1-based page
    pub page: usize,
    pub page_size: usize,
    /// Row offset of the requested page
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// The advanced filter panel applied these conditions
    FiltersApplied(Vec<FilterCondition>),
    FiltersCleared,
    FilterSetApplied { id: String, name: String },
    SortChanged(Option<SortState>),
    GroupingChanged(Option<String>),
    PageChanged { page: usize, page_size: usize },
    SelectionChanged(Vec<RowId>),
    /// Selected nested rows as (parent, child) pairs
    NestedSelectionChanged(Vec<(RowId, RowId)>),
    /// Server mode: the host should load rows for this request
    DataRequested(DataRequest),
    /// Continuous mode reached the end of the loaded window
    LoadMoreRequested { loaded: usize },
    RowAdded(RowId),
    RowEdited(RowId),
    RowDeleted(RowId),
    /// A plugin's custom action was triggered
    PluginAction { plugin_id: String, action_id: String },
}
