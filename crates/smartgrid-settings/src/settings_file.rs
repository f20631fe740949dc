//! Settings file utilities

use anyhow::{Context, Result};
use std::path::PathBuf;

pub fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .context("Could not determine data directory")
        .map(|p| p.join("smartgrid"))
}

pub fn preferences_db_file() -> Result<PathBuf> {
    data_dir().map(|p| p.join("preferences.db"))
}

pub fn filter_sets_db_file() -> Result<PathBuf> {
    data_dir().map(|p| p.join("filter_sets.db"))
}
