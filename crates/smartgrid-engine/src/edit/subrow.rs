//! Nested sub-row sections and the fields computed from them

use serde::{Deserialize, Serialize};

use smartgrid_core::{ColumnDescriptor, Row, RowId, RowKey, Value};

use super::validation::FormValidator;
use crate::selection::{NestedScope, SelectionMode};

/// A field of a nested row computed from its siblings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedField {
    /// `target = factors[0] * factors[1] * ...`
    Product { target: String, factors: Vec<String> },
}

impl DerivedField {
    pub fn product(target: impl Into<String>, factors: &[&str]) -> Self {
        Self::Product {
            target: target.into(),
            factors: factors.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Product { target, .. } => target,
        }
    }

    /// Computed value; null when a factor is missing or not numeric
    pub fn compute(&self, row: &Row) -> Value {
        match self {
            Self::Product { factors, .. } => {
                let values: Vec<&Value> = factors.iter().map(|f| row.value(f)).collect();
                if values.iter().all(|v| matches!(v, Value::Int(_))) {
                    let mut product: i64 = 1;
                    for value in &values {
                        match value.as_i64().and_then(|v| product.checked_mul(v)) {
                            Some(next) => product = next,
                            None => return float_product(&values),
                        }
                    }
                    Value::Int(product)
                } else {
                    float_product(&values)
                }
            }
        }
    }
}

fn float_product(values: &[&Value]) -> Value {
    let mut product = 1.0;
    for value in values {
        match value.as_f64() {
            Some(v) => product *= v,
            None => return Value::Null,
        }
    }
    Value::Float(product)
}

/// A parent field aggregated over its nested rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentAggregate {
    Sum { target: String, source: String },
}

impl ParentAggregate {
    pub fn sum(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self::Sum {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Sum { target, .. } => target,
        }
    }

    /// Aggregate over `children`; non-numeric cells are skipped
    pub fn compute(&self, children: &[Row]) -> Value {
        match self {
            Self::Sum { source, .. } => {
                let cells: Vec<&Value> = children
                    .iter()
                    .map(|c| c.value(source))
                    .filter(|v| !v.is_null())
                    .collect();
                let float_sum = || Value::Float(cells.iter().filter_map(|v| v.as_f64()).sum());
                if !cells.iter().all(|v| matches!(v, Value::Int(_))) {
                    return float_sum();
                }
                cells
                    .iter()
                    .filter_map(|v| v.as_i64())
                    .try_fold(0i64, |total, v| total.checked_add(v))
                    .map(Value::Int)
                    .unwrap_or_else(float_sum)
            }
        }
    }
}

/// Describes the nested rows stored under one array field
#[derive(Debug, Clone)]
pub struct SubRowConfig {
    /// Field of the parent row holding the nested rows
    pub key: String,
    pub columns: Vec<ColumnDescriptor>,
    pub row_key: RowKey,
    pub default_expanded: bool,
    pub selection_mode: SelectionMode,
    pub selection_scope: NestedScope,
    pub derived: Vec<DerivedField>,
    pub aggregates: Vec<ParentAggregate>,
    /// Extra rules for nested rows; the columns' own rules always apply
    pub validator: FormValidator,
}

impl SubRowConfig {
    pub fn new(key: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            key: key.into(),
            columns,
            row_key: RowKey::default(),
            default_expanded: false,
            selection_mode: SelectionMode::None,
            selection_scope: NestedScope::default(),
            derived: Vec::new(),
            aggregates: Vec::new(),
            validator: FormValidator::new(),
        }
    }

    pub fn with_row_key(mut self, row_key: RowKey) -> Self {
        self.row_key = row_key;
        self
    }

    pub fn expanded_by_default(mut self, expanded: bool) -> Self {
        self.default_expanded = expanded;
        self
    }

    pub fn with_selection(mut self, mode: SelectionMode, scope: NestedScope) -> Self {
        self.selection_mode = mode;
        self.selection_scope = scope;
        self
    }

    pub fn with_derived(mut self, derived: DerivedField) -> Self {
        self.derived.push(derived);
        self
    }

    pub fn with_aggregate(mut self, aggregate: ParentAggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    pub fn with_validator(mut self, validator: FormValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Error for `field` of a nested row, if it may not be committed
    pub fn validate_field(&self, field: &str, child: &Row) -> Option<String> {
        self.validator
            .clone()
            .for_columns(&self.columns)
            .validate_field(field, child)
    }

    pub fn column(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Identity of the nested row at `index`
    pub fn child_id(&self, child: &Row, index: usize) -> RowId {
        self.row_key.resolve_or_position(child, index)
    }

    /// Position of the nested row `child` under `parent`
    pub fn child_index(&self, parent: &Row, child: &RowId) -> Option<usize> {
        parent
            .nested(&self.key)?
            .iter()
            .enumerate()
            .position(|(i, row)| &self.child_id(row, i) == child)
    }

    pub fn recompute_child(&self, child: &mut Row) {
        for derived in &self.derived {
            let value = derived.compute(child);
            child.set(derived.target(), value);
        }
    }

    pub fn recompute_parent(&self, parent: &mut Row) {
        for aggregate in &self.aggregates {
            let value = aggregate.compute(parent.nested(&self.key).unwrap_or(&[]));
            parent.set(aggregate.target(), value);
        }
    }

    /// Recompute every nested row, then the parent's aggregates
    pub fn recompute(&self, parent: &mut Row) {
        if let Some(children) = parent.nested_mut(&self.key) {
            for child in children.iter_mut() {
                self.recompute_child(child);
            }
        }
        self.recompute_parent(parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Row {
        let lines = vec![
            Row::new().with("id", 1).with("quantity", 10).with("unit_price", 5).with("total", 50),
            Row::new().with("id", 2).with("quantity", 2).with("unit_price", 7).with("total", 14),
        ];
        Row::new().with("id", 100).with("lines", lines).with("total", 64)
    }

    fn config() -> SubRowConfig {
        SubRowConfig::new("lines", vec![ColumnDescriptor::integer("quantity", "Qty")])
            .with_derived(DerivedField::product("total", &["quantity", "unit_price"]))
            .with_aggregate(ParentAggregate::sum("total", "total"))
    }

    #[test]
    fn test_product_of_ints_stays_int() {
        let row = Row::new().with("a", 3).with("b", 4);
        assert_eq!(DerivedField::product("c", &["a", "b"]).compute(&row), Value::Int(12));
    }

    #[test]
    fn test_product_with_missing_factor_is_null() {
        let row = Row::new().with("a", 3);
        assert_eq!(DerivedField::product("c", &["a", "b"]).compute(&row), Value::Null);
    }

    #[test]
    fn test_product_mixes_floats() {
        let row = Row::new().with("a", 2).with("b", 1.5);
        assert_eq!(DerivedField::product("c", &["a", "b"]).compute(&row), Value::Float(3.0));
    }

    #[test]
    fn test_recompute_updates_children_then_parent() {
        let config = config();
        let mut parent = order();
        parent.nested_mut("lines").unwrap()[0].set("quantity", 20);
        config.recompute(&mut parent);

        assert_eq!(parent.nested("lines").unwrap()[0].value("total"), &Value::Int(100));
        assert_eq!(parent.value("total"), &Value::Int(114));
    }

    #[test]
    fn test_child_index_by_key() {
        let config = config();
        let parent = order();
        assert_eq!(config.child_index(&parent, &RowId::new("2")), Some(1));
        assert_eq!(config.child_index(&parent, &RowId::new("9")), None);
    }

    #[test]
    fn test_sum_overflow_falls_back_to_float() {
        let children = vec![
            Row::new().with("total", i64::MAX),
            Row::new().with("total", 10),
        ];
        let sum = ParentAggregate::sum("total", "total").compute(&children);
        assert_eq!(sum, Value::Float(i64::MAX as f64 + 10.0));
    }

    #[test]
    fn test_nested_rows_use_column_and_extra_rules() {
        let config = SubRowConfig::new(
            "lines",
            vec![ColumnDescriptor::text("sku", "SKU").required().with_max_length(4)],
        )
        .with_validator(FormValidator::new().require("quantity"));

        let line = Row::new().with("sku", "TOO-LONG").with("quantity", 1);
        assert_eq!(
            config.validate_field("sku", &line),
            Some("SKU must be at most 4 characters".to_string())
        );
        assert!(config.validate_field("quantity", &Row::new().with("sku", "A1")).is_some());
        assert_eq!(config.validate_field("sku", &Row::new().with("sku", "A1")), None);
    }
}
