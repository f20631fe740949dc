//! Client-side evaluation of filter conditions against rows

use std::cmp::Ordering;

use smartgrid_core::{
    FilterCondition, FilterOperator, FilterValue, NullPosition, Row, Value, ValueType,
};

/// Check if a row matches all conditions. Incomplete conditions are ignored.
pub fn row_matches_filters(row: &Row, filters: &[FilterCondition]) -> bool {
    filters
        .iter()
        .filter(|f| f.is_valid())
        .all(|f| evaluate_condition(f, row.value(&f.field)))
}

/// Evaluate a single condition against a cell value
pub fn evaluate_condition(condition: &FilterCondition, cell: &Value) -> bool {
    evaluate_operator(
        condition.operator,
        cell,
        &condition.value,
        condition.value_type,
    )
}

/// Evaluate a filter operator against a cell value.
///
/// Multi-valued cells (arrays) match when any element matches, except for the
/// negated operators, which require that no element matches.
pub fn evaluate_operator(
    operator: FilterOperator,
    cell: &Value,
    filter: &FilterValue,
    value_type: ValueType,
) -> bool {
    match operator {
        FilterOperator::IsNull => cell.is_null(),
        FilterOperator::IsNotNull => !cell.is_null(),
        FilterOperator::IsEmpty => cell.is_empty(),
        FilterOperator::IsNotEmpty => !cell.is_empty(),

        FilterOperator::NotEqual => !evaluate_operator(FilterOperator::Equal, cell, filter, value_type),
        FilterOperator::DoesNotContain => {
            !evaluate_operator(FilterOperator::Contains, cell, filter, value_type)
        }
        FilterOperator::DoesNotBeginWith => {
            !evaluate_operator(FilterOperator::BeginsWith, cell, filter, value_type)
        }
        FilterOperator::DoesNotEndWith => {
            !evaluate_operator(FilterOperator::EndsWith, cell, filter, value_type)
        }
        FilterOperator::IsNotBetween => {
            !cell.is_null() && !evaluate_operator(FilterOperator::IsBetween, cell, filter, value_type)
        }
        FilterOperator::IsNotInList => {
            !evaluate_operator(FilterOperator::IsInList, cell, filter, value_type)
        }

        _ => match cell {
            Value::Array(items) => items
                .iter()
                .any(|item| evaluate_scalar(operator, item, filter, value_type)),
            scalar => evaluate_scalar(operator, scalar, filter, value_type),
        },
    }
}

fn evaluate_scalar(
    operator: FilterOperator,
    cell: &Value,
    filter: &FilterValue,
    value_type: ValueType,
) -> bool {
    let target = filter.first();
    let cell_lower = cell.search_text();
    let target_lower = target.search_text();

    match operator {
        FilterOperator::Equal => match value_type {
            ValueType::Number | ValueType::Date | ValueType::DateRange => {
                typed_cmp(cell, target, value_type) == Some(Ordering::Equal)
            }
            ValueType::MultiSelect => in_list(cell, filter, value_type),
            _ => cell_lower == target_lower,
        },

        FilterOperator::LessThan => typed_cmp(cell, target, value_type).is_some_and(Ordering::is_lt),
        FilterOperator::LessThanOrEqual => {
            typed_cmp(cell, target, value_type).is_some_and(Ordering::is_le)
        }
        FilterOperator::GreaterThan => {
            typed_cmp(cell, target, value_type).is_some_and(Ordering::is_gt)
        }
        FilterOperator::GreaterThanOrEqual => {
            typed_cmp(cell, target, value_type).is_some_and(Ordering::is_ge)
        }

        FilterOperator::Contains => cell_lower.contains(&target_lower),
        FilterOperator::BeginsWith => cell_lower.starts_with(&target_lower),
        FilterOperator::EndsWith => cell_lower.ends_with(&target_lower),

        FilterOperator::IsBetween => {
            let (from, to) = match filter {
                FilterValue::Range { from, to } => (from, to),
                FilterValue::Many(items) if items.len() == 2 => (&items[0], &items[1]),
                _ => (target, target),
            };
            let above = from.is_empty()
                || typed_cmp(cell, from, value_type).is_some_and(Ordering::is_ge);
            let below =
                to.is_empty() || typed_cmp(cell, to, value_type).is_some_and(Ordering::is_le);
            !cell.is_null() && above && below
        }

        FilterOperator::IsInList => in_list(cell, filter, value_type),

        // Negated and null operators are handled before dispatch
        _ => false,
    }
}

fn in_list(cell: &Value, filter: &FilterValue, value_type: ValueType) -> bool {
    let cell_lower = cell.search_text();
    let matches = |item: &Value| match value_type {
        ValueType::Number | ValueType::Date => typed_cmp(cell, item, value_type) == Some(Ordering::Equal),
        _ => item.search_text() == cell_lower,
    };
    match filter {
        FilterValue::Many(items) => items.iter().any(matches),
        FilterValue::Range { from, to } => matches(from) || matches(to),
        // Comma-separated list typed into a text box
        FilterValue::Single(Value::String(s)) => s
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .any(|item| matches(&item)),
        FilterValue::Single(v) => matches(v),
    }
}

/// Compare by the declared type. `None` when either side cannot be read as that type.
fn typed_cmp(cell: &Value, target: &Value, value_type: ValueType) -> Option<Ordering> {
    match value_type {
        ValueType::Date | ValueType::DateRange => {
            let (a, b) = (cell.as_date()?, target.as_date()?);
            Some(a.cmp(&b))
        }
        ValueType::Number => {
            let (a, b) = (cell.as_f64()?, target.as_f64()?);
            a.partial_cmp(&b)
        }
        _ => {
            if cell.is_null() || target.is_null() {
                return None;
            }
            Some(cell.compare(target, NullPosition::Last))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(field: &str, vt: ValueType, op: FilterOperator, value: FilterValue) -> FilterCondition {
        FilterCondition::new(field, vt, value).with_operator(op)
    }

    fn trip() -> Row {
        Row::new()
            .with("driver", "Ana King")
            .with("stops", 4)
            .with("depart", "2024-03-10T08:15:00")
            .with("tags", Value::Array(vec!["urgent".into(), "fragile".into()]))
            .with("notes", Value::Null)
    }

    #[test]
    fn test_text_operators_are_case_insensitive() {
        let row = trip();
        let contains = FilterCondition::new("driver", ValueType::Text, Value::from("KING").into());
        assert!(row_matches_filters(&row, &[contains]));

        let begins = cond(
            "driver",
            ValueType::Text,
            FilterOperator::BeginsWith,
            Value::from("ana").into(),
        );
        assert!(row_matches_filters(&row, &[begins]));

        let not_ends = cond(
            "driver",
            ValueType::Text,
            FilterOperator::DoesNotEndWith,
            Value::from("king").into(),
        );
        assert!(!row_matches_filters(&row, &[not_ends]));
    }

    #[test]
    fn test_numeric_comparisons() {
        let row = trip();
        let gt = cond(
            "stops",
            ValueType::Number,
            FilterOperator::GreaterThan,
            Value::from("3").into(),
        );
        let le = cond(
            "stops",
            ValueType::Number,
            FilterOperator::LessThanOrEqual,
            Value::Int(4).into(),
        );
        assert!(row_matches_filters(&row, &[gt, le]));

        let eq = FilterCondition::new("stops", ValueType::Number, Value::Float(4.0).into());
        assert!(row_matches_filters(&row, &[eq]));
    }

    #[test]
    fn test_date_equal_ignores_time() {
        let row = trip();
        let eq = FilterCondition::new("depart", ValueType::Date, Value::from("2024-03-10").into());
        assert!(row_matches_filters(&row, &[eq]));

        let before = cond(
            "depart",
            ValueType::Date,
            FilterOperator::LessThan,
            Value::from("2024-03-10").into(),
        );
        assert!(!row_matches_filters(&row, &[before]));
    }

    #[test]
    fn test_date_range_between_is_inclusive_and_open_ended() {
        let row = trip();
        let range = FilterCondition::new(
            "depart",
            ValueType::DateRange,
            FilterValue::Range {
                from: "2024-03-01".into(),
                to: "2024-03-10".into(),
            },
        );
        assert!(row_matches_filters(&row, &[range]));

        let open = FilterCondition::new(
            "depart",
            ValueType::DateRange,
            FilterValue::Range {
                from: "2024-03-11".into(),
                to: Value::Null,
            },
        );
        assert!(!row_matches_filters(&row, &[open]));
    }

    #[test]
    fn test_in_list_against_multi_valued_cell() {
        let row = trip();
        let any = FilterCondition::new(
            "tags",
            ValueType::MultiSelect,
            FilterValue::Many(vec!["FRAGILE".into(), "cold".into()]),
        );
        assert!(row_matches_filters(&row, &[any]));

        let none = cond(
            "tags",
            ValueType::MultiSelect,
            FilterOperator::IsNotInList,
            FilterValue::Many(vec!["urgent".into()]),
        );
        assert!(!row_matches_filters(&row, &[none]));
    }

    #[test]
    fn test_comma_separated_list() {
        let row = Row::new().with("status", "open");
        let list = cond(
            "status",
            ValueType::Text,
            FilterOperator::IsInList,
            Value::from("closed, open").into(),
        );
        assert!(row_matches_filters(&row, &[list]));
    }

    #[test]
    fn test_null_operators() {
        let row = trip();
        let is_null = cond("notes", ValueType::Text, FilterOperator::IsNull, Value::Null.into());
        let missing_is_null =
            cond("nowhere", ValueType::Text, FilterOperator::IsNull, Value::Null.into());
        let not_empty =
            cond("driver", ValueType::Text, FilterOperator::IsNotEmpty, Value::Null.into());
        assert!(row_matches_filters(&row, &[is_null, missing_is_null, not_empty]));
    }

    #[test]
    fn test_incomplete_conditions_are_ignored() {
        let row = trip();
        let blank = FilterCondition::new("driver", ValueType::Text, Value::from("").into());
        assert!(row_matches_filters(&row, &[blank]));
    }
}
