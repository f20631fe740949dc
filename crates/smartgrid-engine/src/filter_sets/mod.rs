//! Saved filter sets
//!
//! - `types`: filter set records and the persistence contract
//! - `storage`: SQLite implementation of the contract
//! - `manager`: per-grid session cache with notice reporting

mod manager;
mod storage;
mod types;

pub use manager::FilterSetManager;
pub use storage::SqliteFilterSetStore;
pub use types::{FilterSet, FilterSetApi, FilterSetPatch, NewFilterSet};
