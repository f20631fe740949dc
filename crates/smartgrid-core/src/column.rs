//! Column descriptors and the closed editor strategy table
//!
//! Every column has a `ColumnKind`. The kind decides the editor, the filter
//! value type, how raw editor input is normalized and how a value is shown.
//! There is no open-ended dispatch: adding a kind means extending the match
//! arms below.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::capability::{AddNewHandler, OptionItem, OptionSource};
use crate::error::{GridError, GridResult};
use crate::filter_types::ValueType;
use crate::types::{Value, parse_date};

/// Column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Text,
    Integer,
    Date,
    /// Status value rendered with a color from the column's status map
    Badge,
    Link,
    Select,
    MultiSelect,
    /// Select whose options are fetched page by page
    LazySelect,
    LazyMultiSelect,
    EditableText,
    /// Button column, never holds data
    Action,
    /// Two dates stored as a `[from, to]` array
    DateRange,
}

/// Editor strategy used for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    ReadOnly,
    TextInput,
    NumberInput,
    DatePicker,
    DateRangePicker,
    Dropdown,
    MultiDropdown,
    LazyDropdown,
    LazyMultiDropdown,
}

impl EditorKind {
    pub fn is_dropdown(&self) -> bool {
        matches!(
            self,
            Self::Dropdown | Self::MultiDropdown | Self::LazyDropdown | Self::LazyMultiDropdown
        )
    }
}

impl ColumnKind {
    /// Editor used when the column is editable
    pub fn editor(&self) -> EditorKind {
        match self {
            Self::Text | Self::EditableText => EditorKind::TextInput,
            Self::Integer => EditorKind::NumberInput,
            Self::Date => EditorKind::DatePicker,
            Self::DateRange => EditorKind::DateRangePicker,
            Self::Badge | Self::Select => EditorKind::Dropdown,
            Self::MultiSelect => EditorKind::MultiDropdown,
            Self::LazySelect => EditorKind::LazyDropdown,
            Self::LazyMultiSelect => EditorKind::LazyMultiDropdown,
            Self::Link | Self::Action => EditorKind::ReadOnly,
        }
    }

    /// Filter value type for this kind
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Text | Self::EditableText | Self::Link | Self::Action => ValueType::Text,
            Self::Integer => ValueType::Number,
            Self::Date => ValueType::Date,
            Self::DateRange => ValueType::DateRange,
            Self::Badge | Self::Select | Self::LazySelect => ValueType::Select,
            Self::MultiSelect | Self::LazyMultiSelect => ValueType::MultiSelect,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, Self::MultiSelect | Self::LazyMultiSelect)
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Self::LazySelect | Self::LazyMultiSelect)
    }

    /// Normalize raw editor input into the stored representation
    pub fn normalize(&self, raw: Value) -> GridResult<Value> {
        match self {
            Self::Integer => normalize_number(raw),
            Self::Text | Self::EditableText | Self::Link | Self::Badge => Ok(match raw {
                Value::Null => Value::String(String::new()),
                Value::String(s) => Value::String(s),
                other => Value::String(other.to_string()),
            }),
            Self::Date => normalize_date(raw),
            Self::DateRange => match raw {
                Value::Null => Ok(Value::Null),
                Value::Array(items) if items.len() == 2 => {
                    let mut normalized = Vec::with_capacity(2);
                    for item in items {
                        normalized.push(normalize_date(item)?);
                    }
                    Ok(Value::Array(normalized))
                }
                other => Err(GridError::InvalidValue(format!(
                    "date range needs two dates, got '{}'",
                    other
                ))),
            },
            Self::Select | Self::LazySelect => Ok(if raw.is_empty() { Value::Null } else { raw }),
            Self::MultiSelect | Self::LazyMultiSelect => Ok(match raw {
                Value::Null => Value::Array(Vec::new()),
                Value::Array(items) => {
                    Value::Array(items.into_iter().filter(|v| !v.is_empty()).collect())
                }
                single if single.is_empty() => Value::Array(Vec::new()),
                single => Value::Array(vec![single]),
            }),
            Self::Action => Ok(raw),
        }
    }

    pub fn all() -> &'static [ColumnKind] {
        &[
            Self::Text,
            Self::Integer,
            Self::Date,
            Self::Badge,
            Self::Link,
            Self::Select,
            Self::MultiSelect,
            Self::LazySelect,
            Self::LazyMultiSelect,
            Self::EditableText,
            Self::Action,
            Self::DateRange,
        ]
    }
}

fn normalize_number(raw: Value) -> GridResult<Value> {
    match raw {
        Value::Null => Ok(Value::Null),
        Value::Int(v) => Ok(Value::Int(v)),
        Value::Float(v) => Ok(Value::Float(v)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            if let Ok(v) = trimmed.parse::<i64>() {
                return Ok(Value::Int(v));
            }
            trimmed
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| GridError::InvalidValue(format!("'{}' is not a number", trimmed)))
        }
        other => Err(GridError::InvalidValue(format!(
            "'{}' is not a number",
            other
        ))),
    }
}

fn normalize_date(raw: Value) -> GridResult<Value> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    match &raw {
        Value::Date(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
        Value::DateTime(dt) => Ok(Value::String(dt.format("%Y-%m-%d").to_string())),
        Value::String(s) => parse_date(s)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .ok_or_else(|| GridError::InvalidValue(format!("'{}' is not a date", s))),
        other => Err(GridError::InvalidValue(format!("'{}' is not a date", other))),
    }
}

/// Declarative description of one grid column
#[derive(Clone)]
pub struct ColumnDescriptor {
    pub key: String,
    pub label: String,
    pub kind: ColumnKind,
    pub sortable: bool,
    pub filterable: bool,
    pub editable: bool,
    /// Mandatory columns can never be hidden
    pub mandatory: bool,
    pub required: bool,
    pub groupable: bool,
    pub width: Option<f32>,
    pub max_length: Option<usize>,
    /// Status value to color, for badge columns
    pub status_colors: IndexMap<String, String>,
    pub options: Vec<OptionItem>,
    pub option_source: Option<Arc<dyn OptionSource>>,
    pub add_new: Option<Arc<dyn AddNewHandler>>,
    /// Sibling columns that scope this column's options
    pub depends_on: Vec<String>,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            sortable: !matches!(kind, ColumnKind::Action),
            filterable: !matches!(kind, ColumnKind::Action),
            editable: matches!(kind, ColumnKind::EditableText),
            mandatory: false,
            required: false,
            groupable: false,
            width: None,
            max_length: None,
            status_colors: IndexMap::new(),
            options: Vec::new(),
            option_source: None,
            add_new: None,
            depends_on: Vec::new(),
        }
    }

    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, ColumnKind::Text)
    }

    pub fn integer(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, ColumnKind::Integer)
    }

    pub fn date(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, ColumnKind::Date)
    }

    pub fn select(key: impl Into<String>, label: impl Into<String>, options: Vec<OptionItem>) -> Self {
        Self::new(key, label, ColumnKind::Select).with_options(options)
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = filterable;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn groupable(mut self) -> Self {
        self.groupable = true;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_status_color(mut self, status: impl Into<String>, color: impl Into<String>) -> Self {
        self.status_colors.insert(status.into(), color.into());
        self
    }

    pub fn with_options(mut self, options: Vec<OptionItem>) -> Self {
        self.options = options;
        self
    }

    pub fn with_option_source(mut self, source: Arc<dyn OptionSource>) -> Self {
        self.option_source = Some(source);
        self
    }

    pub fn with_add_new(mut self, handler: Arc<dyn AddNewHandler>) -> Self {
        self.add_new = Some(handler);
        self
    }

    pub fn depends_on(mut self, field: impl Into<String>) -> Self {
        self.depends_on.push(field.into());
        self
    }

    /// Editor actually used for cells of this column
    pub fn editor(&self) -> EditorKind {
        if self.editable {
            self.kind.editor()
        } else {
            EditorKind::ReadOnly
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.kind.value_type()
    }

    /// Label of the static option whose value equals `value`
    pub fn option_label(&self, value: &Value) -> Option<&str> {
        self.options
            .iter()
            .find(|o| &o.value == value)
            .map(|o| o.label.as_str())
    }

    /// Text shown for `value` in this column
    pub fn display(&self, value: &Value) -> String {
        if self.options.is_empty() {
            return value.to_string();
        }
        match value {
            Value::Array(items) => items
                .iter()
                .map(|v| self.option_label(v).map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
            other => self
                .option_label(other)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        }
    }

    /// Color for a badge value, if configured
    pub fn status_color(&self, value: &Value) -> Option<&str> {
        self.status_colors.get(&value.to_string()).map(|s| s.as_str())
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("editable", &self.editable)
            .field("mandatory", &self.mandatory)
            .field("groupable", &self.groupable)
            .field("options", &self.options.len())
            .field("option_source", &self.option_source.is_some())
            .field("add_new", &self.add_new.is_some())
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}
