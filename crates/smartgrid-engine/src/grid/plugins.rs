use super::*;

use smartgrid_core::{GridError, GridResult};

use crate::plugin::{GridPlugin, PluginAction, PluginApi, PluginContent};
use crate::selection::SelectionMode;

impl SmartGrid {
    pub fn register_plugin(&mut self, plugin: Arc<dyn GridPlugin>) {
        self.plugins.register(plugin);
    }

    pub fn plugins(&self) -> &PluginHost {
        &self.plugins
    }

    /// Snapshot handed to plugins
    pub fn plugin_api(&self) -> PluginApi {
        let mut actions = vec![PluginAction::ClearSelection];
        if self.selection.mode() == SelectionMode::Multi {
            actions.push(PluginAction::SelectAll);
        }
        actions.push(PluginAction::ResetFilters);

        PluginApi {
            selected_ids: self.selection.selected_ids(),
            selected_rows: self.selected_rows().into_iter().cloned().collect(),
            processed_rows: self.processed_rows().into_iter().cloned().collect(),
            total_rows: self.total_count(),
            actions,
        }
    }

    pub fn toolbar_content(&self) -> Vec<PluginContent> {
        if self.plugins.is_empty() {
            return Vec::new();
        }
        self.plugins.toolbar(&self.plugin_api())
    }

    pub fn footer_content(&self) -> Vec<PluginContent> {
        if self.plugins.is_empty() {
            return Vec::new();
        }
        self.plugins.footer(&self.plugin_api())
    }

    /// Run an action triggered from a plugin's content
    pub async fn dispatch_plugin_action(
        &mut self,
        plugin_id: &str,
        action: PluginAction,
    ) -> GridResult<()> {
        if !self.plugins.plugins().iter().any(|p| p.id() == plugin_id) {
            return Err(GridError::NotFound(format!("plugin '{}'", plugin_id)));
        }
        tracing::debug!(plugin = plugin_id, action = ?action, "Plugin action");
        match action {
            PluginAction::ClearSelection => self.clear_selection(),
            PluginAction::SelectAll => {
                self.select_all();
            }
            PluginAction::ResetFilters => {
                self.clear_quick_filters();
                self.clear_filters().await;
            }
            PluginAction::Custom { id } => self.events.push(GridEvent::PluginAction {
                plugin_id: plugin_id.to_string(),
                action_id: id,
            }),
        }
        Ok(())
    }
}
