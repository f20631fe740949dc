//! Filter set manager
//!
//! Session cache of one user's filter sets for one grid. Every collaborator
//! failure is logged and queued as a notice; callers get `None`/`false`
//! back instead of an error.

use indexmap::IndexMap;
use std::sync::Arc;

use smartgrid_core::{FilterValue, Notice, NoticeQueue};

use super::types::{FilterSet, FilterSetApi, FilterSetPatch, NewFilterSet};

pub struct FilterSetManager {
    api: Arc<dyn FilterSetApi>,
    owner: String,
    grid_id: String,
    sets: Vec<FilterSet>,
    loaded: bool,
    default_checked: bool,
    notices: NoticeQueue,
}

impl FilterSetManager {
    pub fn new(api: Arc<dyn FilterSetApi>, owner: impl Into<String>, grid_id: impl Into<String>) -> Self {
        Self {
            api,
            owner: owner.into(),
            grid_id: grid_id.into(),
            sets: Vec::new(),
            loaded: false,
            default_checked: false,
            notices: NoticeQueue::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn grid_id(&self) -> &str {
        &self.grid_id
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Fetch the user's filter sets into the cache.
    ///
    /// On failure the cache keeps its previous contents.
    pub async fn load(&mut self) -> &[FilterSet] {
        match self
            .api
            .get_user_filter_sets(&self.owner, &self.grid_id)
            .await
        {
            Ok(sets) => {
                tracing::debug!(grid_id = %self.grid_id, count = sets.len(), "Loaded filter sets");
                self.sets = sets;
                self.loaded = true;
            }
            Err(err) => {
                tracing::error!(grid_id = %self.grid_id, "Failed to load filter sets: {}", err);
                self.notices
                    .push(Notice::error(format!("Could not load saved filters: {}", err)));
            }
        }
        &self.sets
    }

    pub fn sets(&self) -> &[FilterSet] {
        &self.sets
    }

    pub fn get(&self, id: &str) -> Option<&FilterSet> {
        self.sets.iter().find(|s| s.id == id)
    }

    pub fn default_set(&self) -> Option<&FilterSet> {
        self.sets.iter().find(|s| s.is_default)
    }

    /// Save the given filter values under `name`.
    ///
    /// With `make_default`, existing defaults are cleared first. When one of
    /// them cannot be cleared the set is saved without the default flag.
    pub async fn save(
        &mut self,
        name: &str,
        filters: IndexMap<String, FilterValue>,
        make_default: bool,
    ) -> Option<FilterSet> {
        let name = name.trim();
        if name.is_empty() {
            self.notices
                .push(Notice::warning("A saved filter needs a name"));
            return None;
        }

        let make_default = if make_default && !self.clear_other_defaults(None).await {
            tracing::warn!(filter = %name, "Saving filter set without the default flag");
            self.notices.push(Notice::warning(format!(
                "Saved filter '{}' could not be made the default",
                name
            )));
            false
        } else {
            make_default
        };

        let new_set = NewFilterSet {
            owner: self.owner.clone(),
            grid_id: self.grid_id.clone(),
            name: name.to_string(),
            filters,
            is_default: make_default,
        };
        match self.api.save_user_filter_set(new_set).await {
            Ok(saved) => {
                tracing::info!(id = %saved.id, filter = %saved.name, "Saved filter set");
                self.replace_cached(saved.clone());
                self.notices
                    .push(Notice::success(format!("Saved filter '{}'", saved.name)));
                Some(saved)
            }
            Err(err) => {
                tracing::error!(filter = %name, "Failed to save filter set: {}", err);
                self.notices
                    .push(Notice::error(format!("Could not save filter '{}': {}", name, err)));
                None
            }
        }
    }

    pub async fn rename(&mut self, id: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            self.notices
                .push(Notice::warning("A saved filter needs a name"));
            return false;
        }
        self.patch(id, FilterSetPatch::rename(name), "rename").await
    }

    /// Overwrite a set's filter values
    pub async fn update_filters(&mut self, id: &str, filters: IndexMap<String, FilterValue>) -> bool {
        let patch = FilterSetPatch {
            filters: Some(filters),
            ..FilterSetPatch::default()
        };
        self.patch(id, patch, "update").await
    }

    /// Promote a set to the grid's default, demoting any other default
    pub async fn set_default(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            self.notices
                .push(Notice::warning("That saved filter no longer exists"));
            return false;
        }
        if !self.clear_other_defaults(Some(id)).await {
            return false;
        }
        self.patch(id, FilterSetPatch::default_flag(true), "set default")
            .await
    }

    pub async fn clear_default(&mut self, id: &str) -> bool {
        self.patch(id, FilterSetPatch::default_flag(false), "clear default")
            .await
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        match self.api.delete_filter_set(id).await {
            Ok(()) => {
                tracing::info!(id, "Deleted filter set");
                self.sets.retain(|s| s.id != id);
                true
            }
            Err(err) => {
                tracing::error!(id, "Failed to delete filter set: {}", err);
                self.notices
                    .push(Notice::error(format!("Could not delete saved filter: {}", err)));
                false
            }
        }
    }

    async fn patch(&mut self, id: &str, patch: FilterSetPatch, action: &str) -> bool {
        match self.api.update_filter_set(id, patch).await {
            Ok(updated) => {
                tracing::info!(id, action, "Updated filter set");
                self.replace_cached(updated);
                true
            }
            Err(err) => {
                tracing::error!(id, action, "Failed to update filter set: {}", err);
                self.notices.push(Notice::error(format!(
                    "Could not {} saved filter: {}",
                    action, err
                )));
                false
            }
        }
    }

    /// Demote every default except `keep`. False when any demotion failed.
    async fn clear_other_defaults(&mut self, keep: Option<&str>) -> bool {
        let others: Vec<String> = self
            .sets
            .iter()
            .filter(|s| s.is_default && Some(s.id.as_str()) != keep)
            .map(|s| s.id.clone())
            .collect();
        let mut cleared = true;
        for id in others {
            cleared &= self
                .patch(&id, FilterSetPatch::default_flag(false), "clear default")
                .await;
        }
        cleared
    }

    fn replace_cached(&mut self, updated: FilterSet) {
        if updated.is_default {
            for set in self.sets.iter_mut() {
                set.is_default = false;
            }
        }
        match self.sets.iter_mut().find(|s| s.id == updated.id) {
            Some(slot) => *slot = updated,
            None => self.sets.push(updated),
        }
        self.sets.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// The default set to auto-apply for this mount.
    ///
    /// Checked once per mount: later calls return `None`, and so does the
    /// first call when filters are already active.
    pub fn take_default_for_mount(&mut self, has_active_filters: bool) -> Option<FilterSet> {
        if self.default_checked {
            return None;
        }
        self.default_checked = true;
        if has_active_filters {
            tracing::debug!(grid_id = %self.grid_id, "Filters active, default filter set skipped");
            return None;
        }
        self.default_set().cloned()
    }

    /// Forget the session cache, as on unmount
    pub fn reset_mount(&mut self) {
        self.sets.clear();
        self.loaded = false;
        self.default_checked = false;
    }
}
