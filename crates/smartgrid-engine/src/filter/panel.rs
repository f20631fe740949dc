//! Advanced filter panel
//!
//! Fields come from filterable columns plus caller-supplied extra fields.
//! The panel holds a value per field; applying turns the non-empty values
//! into conditions with each field's operator.

use indexmap::IndexMap;
use std::sync::Arc;

use smartgrid_core::{
    ColumnDescriptor, ColumnKind, FilterCondition, FilterOperator, FilterValue, GridError,
    GridResult, OptionItem, OptionSource, Value, ValueType,
};

use crate::options::LazyOptionLoader;

/// Editor shown for a filter field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEditor {
    Text,
    Number,
    Date,
    DateRange,
    Dropdown,
    MultiDropdown,
    /// Server-side options, fetched page by page
    LazyDropdown { multiple: bool },
    Checkbox,
}

impl FilterEditor {
    fn for_field(value_type: ValueType, lazy: bool) -> Self {
        match (value_type, lazy) {
            (ValueType::Select, true) => Self::LazyDropdown { multiple: false },
            (ValueType::MultiSelect, true) => Self::LazyDropdown { multiple: true },
            (ValueType::Text, _) => Self::Text,
            (ValueType::Number, _) => Self::Number,
            (ValueType::Date, _) => Self::Date,
            (ValueType::DateRange, _) => Self::DateRange,
            (ValueType::Select, false) => Self::Dropdown,
            (ValueType::MultiSelect, false) => Self::MultiDropdown,
            (ValueType::Boolean, _) => Self::Checkbox,
        }
    }
}

#[derive(Clone)]
pub struct FilterField {
    pub key: String,
    pub label: String,
    pub value_type: ValueType,
    pub operator: FilterOperator,
    pub editor: FilterEditor,
    pub options: Vec<OptionItem>,
    pub option_source: Option<Arc<dyn OptionSource>>,
}

impl FilterField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value_type,
            operator: FilterOperator::default_for(value_type),
            editor: FilterEditor::for_field(value_type, false),
            options: Vec::new(),
            option_source: None,
        }
    }

    pub fn from_column(column: &ColumnDescriptor) -> Self {
        // Badge columns filter on their status values
        let value_type = match column.kind {
            ColumnKind::Badge if column.options.is_empty() => ValueType::Text,
            _ => column.value_type(),
        };
        let mut field = Self::new(column.key.clone(), column.label.clone(), value_type)
            .with_options(column.options.clone());
        if let Some(source) = &column.option_source {
            field = field.with_option_source(source.clone());
        }
        field
    }

    pub fn with_operator(mut self, operator: FilterOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_options(mut self, options: Vec<OptionItem>) -> Self {
        self.options = options;
        self
    }

    pub fn with_option_source(mut self, source: Arc<dyn OptionSource>) -> Self {
        self.option_source = Some(source);
        self.editor = FilterEditor::for_field(self.value_type, true);
        self
    }

    pub fn operator_label(&self) -> &'static str {
        self.operator.label_for(self.value_type)
    }
}

impl std::fmt::Debug for FilterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterField")
            .field("key", &self.key)
            .field("value_type", &self.value_type)
            .field("operator", &self.operator)
            .field("editor", &self.editor)
            .finish_non_exhaustive()
    }
}

pub struct FilterPanel {
    fields: Vec<FilterField>,
    values: IndexMap<String, FilterValue>,
    applied: Vec<FilterCondition>,
    loaders: IndexMap<String, LazyOptionLoader>,
}

impl FilterPanel {
    pub fn new(fields: Vec<FilterField>, option_page_size: usize) -> Self {
        let loaders = fields
            .iter()
            .filter_map(|field| {
                field.option_source.as_ref().map(|source| {
                    (
                        field.key.clone(),
                        LazyOptionLoader::new(source.clone(), option_page_size),
                    )
                })
            })
            .collect();
        Self {
            fields,
            values: IndexMap::new(),
            applied: Vec::new(),
            loaders,
        }
    }

    /// Fields for every filterable column, followed by `extra`
    pub fn from_columns(
        columns: &[ColumnDescriptor],
        extra: Vec<FilterField>,
        option_page_size: usize,
    ) -> Self {
        let mut fields: Vec<FilterField> = columns
            .iter()
            .filter(|c| c.filterable)
            .map(FilterField::from_column)
            .collect();
        for field in extra {
            if fields.iter().any(|f| f.key == field.key) {
                tracing::warn!(field = %field.key, "Duplicate filter field ignored");
                continue;
            }
            fields.push(field);
        }
        Self::new(fields, option_page_size)
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.key == key)
    }

    fn field_mut(&mut self, key: &str) -> GridResult<&mut FilterField> {
        self.fields
            .iter_mut()
            .find(|f| f.key == key)
            .ok_or_else(|| GridError::NotFound(format!("filter field '{}'", key)))
    }

    /// Set a field's value. Empty values remove it.
    pub fn set_value(&mut self, key: &str, value: Value) -> GridResult<()> {
        let value_type = self.field_mut(key)?.value_type;
        let filter_value = FilterValue::from_value(value, value_type);
        self.set_filter_value(key, filter_value)
    }

    pub fn set_filter_value(&mut self, key: &str, value: FilterValue) -> GridResult<()> {
        self.field_mut(key)?;
        if value.is_empty() {
            self.values.shift_remove(key);
        } else {
            self.values.insert(key.to_string(), value);
        }
        Ok(())
    }

    pub fn set_operator(&mut self, key: &str, operator: FilterOperator) -> GridResult<()> {
        self.field_mut(key)?.operator = operator;
        Ok(())
    }

    pub fn value(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &IndexMap<String, FilterValue> {
        &self.values
    }

    /// Replace all values. Unknown fields are skipped.
    pub fn load_values(&mut self, values: &IndexMap<String, FilterValue>) {
        self.values.clear();
        for (key, value) in values {
            if self.field(key).is_none() {
                tracing::warn!(field = %key, "Skipping value for unknown filter field");
                continue;
            }
            if !value.is_empty() {
                self.values.insert(key.clone(), value.clone());
            }
        }
    }

    /// Restore panel state from previously applied conditions
    pub fn restore(&mut self, conditions: &[FilterCondition]) {
        self.values.clear();
        for condition in conditions {
            let Some(field) = self.fields.iter_mut().find(|f| f.key == condition.field) else {
                continue;
            };
            field.operator = condition.operator;
            self.values
                .insert(condition.field.clone(), condition.value.clone());
        }
        self.applied = conditions.to_vec();
    }

    /// Conditions for the current values, in field order
    pub fn conditions(&self) -> Vec<FilterCondition> {
        self.fields
            .iter()
            .filter_map(|field| {
                let value = self.values.get(&field.key)?;
                let condition = FilterCondition {
                    field: field.key.clone(),
                    operator: field.operator,
                    value: value.clone(),
                    value_type: field.value_type,
                };
                condition.is_valid().then_some(condition)
            })
            .collect()
    }

    /// Recompute conditions from the value map and make them the applied set
    pub fn handle_apply(&mut self) -> Vec<FilterCondition> {
        self.applied = self.conditions();
        tracing::info!(count = self.applied.len(), "Applied filters");
        self.applied.clone()
    }

    /// Empty the value map and the applied set
    pub fn handle_clear(&mut self) {
        self.values.clear();
        self.applied.clear();
        tracing::info!("Cleared filters");
    }

    pub fn applied(&self) -> &[FilterCondition] {
        &self.applied
    }

    pub fn active_count(&self) -> usize {
        self.applied.len()
    }

    pub fn loader_mut(&mut self, key: &str) -> Option<&mut LazyOptionLoader> {
        self.loaders.get_mut(key)
    }

    pub fn reset_loaders(&mut self) {
        for loader in self.loaders.values_mut() {
            loader.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use smartgrid_core::StaticOptionSource;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::text("driver", "Driver"),
            ColumnDescriptor::integer("stops", "Stops"),
            ColumnDescriptor::date("depart", "Departure"),
            ColumnDescriptor::new("tags", "Tags", ColumnKind::MultiSelect),
            ColumnDescriptor::new("window", "Window", ColumnKind::DateRange),
            ColumnDescriptor::new("depot", "Depot", ColumnKind::LazySelect)
                .with_option_source(Arc::new(StaticOptionSource::default())),
            ColumnDescriptor::text("internal", "Internal").filterable(false),
        ]
    }

    #[test]
    fn test_fields_get_type_defaults() {
        let panel = FilterPanel::from_columns(
            &columns(),
            vec![FilterField::new("region", "Region", ValueType::Select)],
            20,
        );
        let summary: Vec<(&str, FilterOperator, FilterEditor)> = panel
            .fields()
            .iter()
            .map(|f| (f.key.as_str(), f.operator, f.editor))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("driver", FilterOperator::Contains, FilterEditor::Text),
                ("stops", FilterOperator::Equal, FilterEditor::Number),
                ("depart", FilterOperator::Equal, FilterEditor::Date),
                ("tags", FilterOperator::IsInList, FilterEditor::MultiDropdown),
                ("window", FilterOperator::IsBetween, FilterEditor::DateRange),
                (
                    "depot",
                    FilterOperator::Equal,
                    FilterEditor::LazyDropdown { multiple: false }
                ),
                ("region", FilterOperator::Equal, FilterEditor::Dropdown),
            ]
        );
    }

    #[test]
    fn test_empty_value_removes_filter() {
        let mut panel = FilterPanel::from_columns(&columns(), vec![], 20);
        panel.set_value("driver", "ana".into()).unwrap();
        assert_eq!(panel.handle_apply().len(), 1);

        panel.set_value("driver", "".into()).unwrap();
        assert!(panel.handle_apply().is_empty());
    }

    #[test]
    fn test_unknown_field_is_not_found() {
        let mut panel = FilterPanel::from_columns(&columns(), vec![], 20);
        assert!(matches!(
            panel.set_value("internal", "x".into()),
            Err(GridError::NotFound(_))
        ));
    }

    #[test]
    fn test_apply_then_clear() {
        let mut panel = FilterPanel::from_columns(&columns(), vec![], 20);
        panel.set_value("stops", Value::Int(3)).unwrap();
        panel
            .set_value(
                "window",
                Value::Array(vec!["2024-01-01".into(), "2024-01-31".into()]),
            )
            .unwrap();
        let applied = panel.handle_apply();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[1].operator, FilterOperator::IsBetween);

        panel.handle_clear();
        assert!(panel.values().is_empty());
        assert!(panel.applied().is_empty());
    }

    #[test]
    fn test_restore_from_conditions() {
        let mut panel = FilterPanel::from_columns(&columns(), vec![], 20);
        let conditions = vec![
            FilterCondition::new("driver", ValueType::Text, Value::from("ann").into())
                .with_operator(FilterOperator::BeginsWith),
        ];
        panel.restore(&conditions);
        assert_eq!(panel.conditions(), conditions);
        assert_eq!(panel.active_count(), 1);
    }

    #[test]
    fn test_lazy_fields_get_loaders() {
        let mut panel = FilterPanel::from_columns(&columns(), vec![], 20);
        assert!(panel.loader_mut("depot").is_some());
        assert!(panel.loader_mut("driver").is_none());
    }
}
