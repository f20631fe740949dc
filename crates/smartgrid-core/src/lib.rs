//! SmartGrid Core - Core abstractions and types for the tabular data engine
//!
//! This crate provides the fundamental types that all other SmartGrid
//! crates depend on. It defines:
//!
//! - `Value`, `Row`, `RowId`, `RowKey` - the dataset model and stable row identity
//! - `ColumnDescriptor` / `ColumnKind` - declarative column description and the
//!   closed editor strategy table
//! - `FilterCondition`, `FilterOperator`, `SortState` - shared filter/sort types
//! - `OptionSource`, `AddNewHandler`, `RowMutationHandler` - collaborator contracts
//! - `GridError` and `Notice` - error and user-notice types

mod capability;
mod column;
mod error;
pub mod filter_types;
mod notice;
mod types;

pub use capability::*;
pub use column::*;
pub use error::*;
pub use filter_types::{
    FilterCondition, FilterOperator, FilterValue, NullPosition, SortDirection, SortState,
    ValueType,
};
pub use notice::*;
pub use types::*;
