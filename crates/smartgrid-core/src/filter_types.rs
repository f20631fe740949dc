//! Filter and sort types shared by the preference model and the engine
//!
//! A `FilterCondition` pairs a field with an operator and a `FilterValue`;
//! conditions are combined with AND when evaluated.

use serde::{Deserialize, Serialize};

use crate::types::Value;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    // Equality operators
    #[default]
    Equal,
    NotEqual,

    // Comparison operators
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // String operators
    Contains,
    DoesNotContain,
    BeginsWith,
    DoesNotBeginWith,
    EndsWith,
    DoesNotEndWith,

    // NULL/Empty operators
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,

    // Range operators
    IsBetween,
    IsNotBetween,

    // List operators
    IsInList,
    IsNotInList,
}

impl FilterOperator {
    /// Get the display label for the operator
    pub fn label(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::Contains => "contains",
            Self::DoesNotContain => "does not contain",
            Self::BeginsWith => "begins with",
            Self::DoesNotBeginWith => "does not begin with",
            Self::EndsWith => "ends with",
            Self::DoesNotEndWith => "does not end with",
            Self::IsNull => "is null",
            Self::IsNotNull => "is not null",
            Self::IsEmpty => "is empty",
            Self::IsNotEmpty => "is not empty",
            Self::IsBetween => "is between",
            Self::IsNotBetween => "is not between",
            Self::IsInList => "is in list",
            Self::IsNotInList => "is not in list",
        }
    }

    /// Label as shown for a field of the given type
    pub fn label_for(&self, value_type: ValueType) -> &'static str {
        match (value_type, self) {
            (ValueType::Date | ValueType::DateRange, Self::LessThan) => "before",
            (ValueType::Date | ValueType::DateRange, Self::GreaterThan) => "after",
            (ValueType::Date | ValueType::DateRange, Self::LessThanOrEqual) => "on or before",
            (ValueType::Date | ValueType::DateRange, Self::GreaterThanOrEqual) => "on or after",
            _ => self.label(),
        }
    }

    /// Default operator for a field of the given type
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Text => Self::Contains,
            ValueType::Number | ValueType::Date | ValueType::Select | ValueType::Boolean => {
                Self::Equal
            }
            ValueType::MultiSelect => Self::IsInList,
            ValueType::DateRange => Self::IsBetween,
        }
    }

    /// Returns true if this operator requires a value input
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            Self::IsNull | Self::IsNotNull | Self::IsEmpty | Self::IsNotEmpty
        )
    }

    /// Returns true if this operator requires two values (for BETWEEN)
    pub fn requires_two_values(&self) -> bool {
        matches!(self, Self::IsBetween | Self::IsNotBetween)
    }

    /// Get all available operators in display order
    pub fn all() -> &'static [FilterOperator] {
        &[
            Self::Equal,
            Self::NotEqual,
            Self::LessThan,
            Self::LessThanOrEqual,
            Self::GreaterThan,
            Self::GreaterThanOrEqual,
            Self::Contains,
            Self::DoesNotContain,
            Self::BeginsWith,
            Self::DoesNotBeginWith,
            Self::EndsWith,
            Self::DoesNotEndWith,
            Self::IsNull,
            Self::IsNotNull,
            Self::IsEmpty,
            Self::IsNotEmpty,
            Self::IsBetween,
            Self::IsNotBetween,
            Self::IsInList,
            Self::IsNotInList,
        ]
    }
}

/// Declared type of a filterable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    #[default]
    Text,
    Number,
    Date,
    DateRange,
    Select,
    MultiSelect,
    Boolean,
}

/// The value side of a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    Single(Value),
    Range { from: Value, to: Value },
    Many(Vec<Value>),
}

impl FilterValue {
    /// Empty filter values remove the filter
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Single(v) => v.is_empty(),
            FilterValue::Range { from, to } => from.is_empty() && to.is_empty(),
            FilterValue::Many(items) => items.iter().all(Value::is_empty),
        }
    }

    /// Convert a raw editor value into the filter shape for `value_type`
    pub fn from_value(value: Value, value_type: ValueType) -> Self {
        match (value_type, value) {
            (ValueType::DateRange, Value::Array(mut items)) => {
                let to = if items.len() > 1 { items.remove(1) } else { Value::Null };
                let from = if items.is_empty() { Value::Null } else { items.remove(0) };
                FilterValue::Range { from, to }
            }
            (ValueType::MultiSelect, Value::Array(items)) => FilterValue::Many(items),
            (ValueType::MultiSelect, Value::Null) => FilterValue::Many(Vec::new()),
            (ValueType::MultiSelect, single) => FilterValue::Many(vec![single]),
            (_, value) => FilterValue::Single(value),
        }
    }

    /// The first scalar (for single-valued operators)
    pub fn first(&self) -> &Value {
        static NULL: Value = Value::Null;
        match self {
            FilterValue::Single(v) => v,
            FilterValue::Range { from, .. } => from,
            FilterValue::Many(items) => items.first().unwrap_or(&NULL),
        }
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        FilterValue::Single(value)
    }
}

/// A single filter condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Field (column key) the condition applies to
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
    /// Declared value type of the field
    #[serde(default)]
    pub value_type: ValueType,
}

impl FilterCondition {
    /// Condition using the default operator for `value_type`
    pub fn new(field: impl Into<String>, value_type: ValueType, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::default_for(value_type),
            value,
            value_type,
        }
    }

    pub fn with_operator(mut self, operator: FilterOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Check if this is a complete filter
    pub fn is_valid(&self) -> bool {
        if self.field.is_empty() {
            return false;
        }
        // NULL/Empty operators don't need a value
        if !self.operator.requires_value() {
            return true;
        }
        !self.value.is_empty()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// The single active sort of a grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Configuration for null value handling in sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPosition {
    /// Null values appear first
    First,
    /// Null values appear last
    #[default]
    Last,
}
