//! Row validation: required fields, max lengths and custom rules

use indexmap::IndexMap;
use std::sync::Arc;

use smartgrid_core::{ColumnDescriptor, Row, ValidationErrors};

/// Custom rule returning field to message
pub type CustomValidator = Arc<dyn Fn(&Row) -> ValidationErrors + Send + Sync>;

/// Rules declared on the column descriptors
#[derive(Debug, Clone, Default)]
struct ColumnRules {
    required: Vec<String>,
    max_lengths: IndexMap<String, usize>,
    labels: IndexMap<String, String>,
}

impl ColumnRules {
    fn from_columns(columns: &[ColumnDescriptor]) -> Self {
        let mut rules = Self::default();
        for column in columns {
            rules.labels.insert(column.key.clone(), column.label.clone());
            if column.required {
                rules.required.push(column.key.clone());
            }
            if let Some(max) = column.max_length {
                rules.max_lengths.insert(column.key.clone(), max);
            }
        }
        rules
    }
}

/// Column rules plus rules added by the host.
///
/// The host's rules survive a schema change; see [`FormValidator::for_columns`].
#[derive(Clone, Default)]
pub struct FormValidator {
    columns: ColumnRules,
    required: Vec<String>,
    max_lengths: IndexMap<String, usize>,
    custom: Vec<CustomValidator>,
}

impl FormValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Required and max-length rules declared on the columns
    pub fn from_columns(columns: &[ColumnDescriptor]) -> Self {
        Self::new().for_columns(columns)
    }

    /// Replace the column-derived rules, keeping the host's own rules
    pub fn for_columns(mut self, columns: &[ColumnDescriptor]) -> Self {
        self.columns = ColumnRules::from_columns(columns);
        self
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.required.contains(&field) {
            self.required.push(field);
        }
        self
    }

    pub fn max_length(mut self, field: impl Into<String>, max: usize) -> Self {
        self.max_lengths.insert(field.into(), max);
        self
    }

    pub fn with_custom(mut self, rule: CustomValidator) -> Self {
        self.custom.push(rule);
        self
    }

    fn label<'a>(&'a self, field: &'a str) -> &'a str {
        self.columns
            .labels
            .get(field)
            .map(String::as_str)
            .unwrap_or(field)
    }

    /// All errors for `row`; empty when the row may be committed
    pub fn validate(&self, row: &Row) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in self.columns.required.iter().chain(&self.required) {
            if row.value(field).is_empty() {
                errors.insert(field.clone(), format!("{} is required", self.label(field)));
            }
        }
        for (field, max) in self.columns.max_lengths.iter().chain(&self.max_lengths) {
            let length = row.value(field).to_string().chars().count();
            if length > *max {
                errors.insert(
                    field.clone(),
                    format!("{} must be at most {} characters", self.label(field), max),
                );
            }
        }
        for rule in &self.custom {
            errors.merge(rule(row));
        }
        errors
    }

    /// Errors for a single field
    pub fn validate_field(&self, field: &str, row: &Row) -> Option<String> {
        self.validate(row).get(field).map(str::to_string)
    }
}

impl std::fmt::Debug for FormValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormValidator")
            .field("columns", &self.columns)
            .field("required", &self.required)
            .field("max_lengths", &self.max_lengths)
            .field("custom", &self.custom.len())
            .finish_non_exhaustive()
    }
}
