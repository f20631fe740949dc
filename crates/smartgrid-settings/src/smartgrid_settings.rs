//! SmartGrid Settings
//!
//! Per-grid user preferences with persistence:
//! - `GridPreferences` and reconciliation against the current column schema
//! - `PreferenceStore` contract, with a client-local default over a
//!   `KeyValueStore` (SQLite on disk, or in memory)
//! - `PreferenceModel`, the instance-owned preference cache used by a grid

mod kv;
mod model;
mod preferences;
mod settings_file;
mod store;

pub use kv::*;
pub use model::*;
pub use preferences::*;
pub use settings_file::*;
pub use store::*;
