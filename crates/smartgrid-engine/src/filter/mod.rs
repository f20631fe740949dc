//! Filter engine: quick filters, the advanced filter panel and evaluation

mod evaluate;
mod panel;
mod quick;

pub use evaluate::{evaluate_condition, evaluate_operator, row_matches_filters};
pub use panel::{FilterEditor, FilterField, FilterPanel};
pub use quick::QuickFilters;
