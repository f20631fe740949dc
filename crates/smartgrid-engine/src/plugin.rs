//! Grid plugins
//!
//! A plugin looks at a read-only snapshot of the grid and returns
//! declarative toolbar or footer content. The host concatenates the content
//! of all plugins in registration order and routes triggered actions back
//! to the grid.

use serde::Serialize;
use std::sync::Arc;

use smartgrid_core::{Row, RowId};

/// Something a plugin button can trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginAction {
    ClearSelection,
    SelectAll,
    ResetFilters,
    /// Routed to the host as `GridEvent::PluginAction`
    Custom { id: String },
}

impl PluginAction {
    pub fn custom(id: impl Into<String>) -> Self {
        Self::Custom { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginItem {
    Text { text: String },
    Summary { label: String, value: String },
    Action { label: String, action: PluginAction },
}

/// Content contributed by one plugin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginContent {
    pub plugin_id: String,
    pub items: Vec<PluginItem>,
}

/// Read-only view of the grid handed to plugins
#[derive(Debug, Clone)]
pub struct PluginApi {
    pub selected_ids: Vec<RowId>,
    pub selected_rows: Vec<Row>,
    /// Rows after filtering, sorting and grouping, across all pages
    pub processed_rows: Vec<Row>,
    pub total_rows: usize,
    pub actions: Vec<PluginAction>,
}

impl PluginApi {
    pub fn selected_count(&self) -> usize {
        self.selected_ids.len()
    }

    /// Sum of a numeric field over the selected rows
    pub fn selected_sum(&self, field: &str) -> f64 {
        self.selected_rows
            .iter()
            .filter_map(|r| r.value(field).as_f64())
            .sum()
    }

    pub fn can(&self, action: &PluginAction) -> bool {
        self.actions.contains(action)
    }
}

pub trait GridPlugin: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn toolbar(&self, _api: &PluginApi) -> Option<Vec<PluginItem>> {
        None
    }

    fn footer(&self, _api: &PluginApi) -> Option<Vec<PluginItem>> {
        None
    }
}

#[derive(Default, Clone)]
pub struct PluginHost {
    plugins: Vec<Arc<dyn GridPlugin>>,
}

impl PluginHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Arc<dyn GridPlugin>) {
        if self.plugins.iter().any(|p| p.id() == plugin.id()) {
            tracing::warn!(plugin = plugin.id(), "Plugin already registered");
            return;
        }
        tracing::debug!(plugin = plugin.id(), "Registered grid plugin");
        self.plugins.push(plugin);
    }

    pub fn plugins(&self) -> &[Arc<dyn GridPlugin>] {
        &self.plugins
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn toolbar(&self, api: &PluginApi) -> Vec<PluginContent> {
        self.collect(|plugin| plugin.toolbar(api))
    }

    pub fn footer(&self, api: &PluginApi) -> Vec<PluginContent> {
        self.collect(|plugin| plugin.footer(api))
    }

    fn collect(&self, render: impl Fn(&dyn GridPlugin) -> Option<Vec<PluginItem>>) -> Vec<PluginContent> {
        self.plugins
            .iter()
            .filter_map(|plugin| {
                let items = render(plugin.as_ref())?;
                (!items.is_empty()).then(|| PluginContent {
                    plugin_id: plugin.id().to_string(),
                    items,
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.id()))
            .finish()
    }
}

/// Footer showing how many rows are selected, with a clear button
#[derive(Debug, Clone, Default)]
pub struct SelectionSummaryPlugin {
    /// Numeric field summed over the selection
    pub sum_field: Option<String>,
}

impl SelectionSummaryPlugin {
    pub fn summing(field: impl Into<String>) -> Self {
        Self {
            sum_field: Some(field.into()),
        }
    }
}

impl GridPlugin for SelectionSummaryPlugin {
    fn id(&self) -> &str {
        "selection-summary"
    }

    fn name(&self) -> &str {
        "Selection summary"
    }

    fn footer(&self, api: &PluginApi) -> Option<Vec<PluginItem>> {
        if api.selected_count() == 0 {
            return None;
        }
        let mut items = vec![PluginItem::Summary {
            label: "Selected".into(),
            value: format!("{} of {}", api.selected_count(), api.processed_rows.len()),
        }];
        if let Some(field) = &self.sum_field {
            items.push(PluginItem::Summary {
                label: format!("Total {}", field),
                value: format!("{}", api.selected_sum(field)),
            });
        }
        if api.can(&PluginAction::ClearSelection) {
            items.push(PluginItem::Action {
                label: "Clear selection".into(),
                action: PluginAction::ClearSelection,
            });
        }
        Some(items)
    }
}
