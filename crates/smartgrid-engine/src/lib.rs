//! SmartGrid Engine - headless tabular data controller
//!
//! `SmartGrid` owns a dataset and the state a table view needs around it:
//!
//! - Column preferences (visibility, order, widths, labels, page size)
//! - Quick filters, the advanced filter panel and saved filter sets
//! - Sorting, grouping and pagination (client or server mode)
//! - Row selection, nested sub-rows and their expansion
//! - Inline cell editing with lazy and cascading options
//! - A form panel for adding and editing rows
//! - Plugins contributing toolbar and footer content
//!
//! The engine renders nothing. Hosts read the computed view, drive the
//! operations and drain [`GridEvent`]s and notices after each call.

pub mod edit;
pub mod events;
pub mod expansion;
pub mod filter;
pub mod filter_sets;
pub mod form;
pub mod gate;
mod grid;
pub mod group;
pub mod logging;
pub mod options;
pub mod pagination;
pub mod plugin;
pub mod selection;
pub mod sort;

pub use edit::{CellAddress, DerivedField, FormValidator, ParentAggregate, SubRowConfig};
pub use events::{DataRequest, GridEvent};
pub use filter::{FilterEditor, FilterField, FilterPanel, QuickFilters};
pub use filter_sets::{FilterSet, FilterSetApi, FilterSetManager, SqliteFilterSetStore};
pub use form::{FormField, FormMode, FormPanel, FormSubmission};
pub use gate::GridAction;
pub use grid::{DataMode, GridConfig, GridRow, SmartGrid, SmartGridBuilder};
pub use options::{FetchOutcome, LazyOptionLoader};
pub use pagination::{PaginationMode, PaginationState};
pub use plugin::{GridPlugin, PluginAction, PluginApi, PluginContent, PluginItem, SelectionSummaryPlugin};
pub use selection::{DefaultSelection, NestedScope, SelectionMode};
pub use sort::SortController;

pub use smartgrid_core as core;
pub use smartgrid_settings as settings;
