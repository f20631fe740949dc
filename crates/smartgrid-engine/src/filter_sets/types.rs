use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use smartgrid_core::{FilterValue, GridResult};

/// A named, saved map of filter values for one grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub id: String,
    pub owner: String,
    pub grid_id: String,
    pub name: String,
    pub filters: IndexMap<String, FilterValue>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a filter set
#[derive(Debug, Clone, PartialEq)]
pub struct NewFilterSet {
    pub owner: String,
    pub grid_id: String,
    pub name: String,
    pub filters: IndexMap<String, FilterValue>,
    pub is_default: bool,
}

/// Partial update of a filter set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSetPatch {
    pub name: Option<String>,
    pub filters: Option<IndexMap<String, FilterValue>>,
    pub is_default: Option<bool>,
}

impl FilterSetPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn default_flag(is_default: bool) -> Self {
        Self {
            is_default: Some(is_default),
            ..Self::default()
        }
    }
}

/// Filter-set persistence collaborator
#[async_trait]
pub trait FilterSetApi: Send + Sync {
    async fn get_user_filter_sets(&self, owner: &str, grid_id: &str) -> GridResult<Vec<FilterSet>>;

    async fn save_user_filter_set(&self, set: NewFilterSet) -> GridResult<FilterSet>;

    async fn update_filter_set(&self, id: &str, patch: FilterSetPatch) -> GridResult<FilterSet>;

    async fn delete_filter_set(&self, id: &str) -> GridResult<()>;
}
