//! Integration tests for selection, nested sub-rows and expansion

mod common;

use pretty_assertions::assert_eq;
use std::sync::Arc;

use smartgrid_core::{ColumnDescriptor, GridError, Row, RowId, RowKey, Value};
use smartgrid_engine::{
    DefaultSelection, DerivedField, GridConfig, GridEvent, NestedScope, ParentAggregate,
    SelectionMode, SmartGrid, SubRowConfig,
    edit::CellAddress,
};

use common::{MockPreferenceStore, ids, trip_columns, trip_rows};

fn trips_grid(config: GridConfig) -> SmartGrid {
    SmartGrid::builder(config)
        .columns(trip_columns())
        .rows(trip_rows())
        .preference_store(Arc::new(MockPreferenceStore::new()))
        .build()
}

fn item(sku: &str, qty: i64, price: i64) -> Row {
    Row::new()
        .with("sku", sku)
        .with("qty", qty)
        .with("price", price)
}

fn orders() -> Vec<Row> {
    vec![
        Row::new()
            .with("id", 1)
            .with("customer", "Acme")
            .with("items", vec![item("A-1", 10, 5), item("B-2", 2, 3)]),
        Row::new()
            .with("id", 2)
            .with("customer", "Globex")
            .with("items", vec![item("C-3", 1, 40)]),
        Row::new()
            .with("id", 3)
            .with("customer", "Initech")
            .with("items", Vec::<Row>::new()),
    ]
}

fn order_grid(default_expanded: bool, scope: NestedScope) -> SmartGrid {
    let columns = vec![
        ColumnDescriptor::integer("id", "ID"),
        ColumnDescriptor::text("customer", "Customer"),
        ColumnDescriptor::integer("order_total", "Total"),
    ];
    let sub_rows = SubRowConfig::new(
        "items",
        vec![
            ColumnDescriptor::text("sku", "SKU"),
            ColumnDescriptor::integer("qty", "Qty").editable(true).required(),
            ColumnDescriptor::text("note", "Note").editable(true).with_max_length(8),
            ColumnDescriptor::integer("price", "Price").editable(true),
            ColumnDescriptor::integer("total", "Line total"),
        ],
    )
    .with_row_key(RowKey::field("sku"))
    .expanded_by_default(default_expanded)
    .with_selection(SelectionMode::Multi, scope)
    .with_derived(DerivedField::product("total", &["qty", "price"]))
    .with_aggregate(ParentAggregate::sum("order_total", "total"));

    SmartGrid::builder(GridConfig::new("orders"))
        .columns(columns)
        .rows(orders())
        .sub_rows(sub_rows)
        .preference_store(Arc::new(MockPreferenceStore::new()))
        .build()
}

// ============ Top-level selection ============

#[tokio::test]
async fn default_indices_select_dataset_rows() {
    let config = GridConfig {
        default_selection: Some(DefaultSelection::Indices(vec![0, 2, 4])),
        page_size: 2,
        ..GridConfig::new("trips")
    };
    let mut grid = trips_grid(config);
    grid.mount().await;

    assert_eq!(grid.selected_ids(), ids(&[1, 3, 5]));
    assert_eq!(grid.selected_rows().len(), 3);
}

#[tokio::test]
async fn default_selection_in_single_mode_keeps_first() {
    let config = GridConfig {
        default_selection: Some(DefaultSelection::Ids(ids(&[4, 6]))),
        selection_mode: SelectionMode::Single,
        ..GridConfig::new("trips")
    };
    let mut grid = trips_grid(config);
    grid.mount().await;

    assert_eq!(grid.selected_ids(), ids(&[4]));
}

#[tokio::test]
async fn toggling_twice_restores_selection() {
    let mut grid = trips_grid(GridConfig::new("trips"));
    grid.mount().await;
    let id = RowId::from(2);

    assert!(grid.toggle_row(&id));
    assert!(grid.is_row_selected(&id));
    assert!(!grid.toggle_row(&id));
    assert!(grid.selected_ids().is_empty());

    let changes = grid
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, GridEvent::SelectionChanged(_)))
        .count();
    assert_eq!(changes, 2);
}

#[tokio::test]
async fn single_mode_replaces_selection() {
    let config = GridConfig {
        selection_mode: SelectionMode::Single,
        ..GridConfig::new("trips")
    };
    let mut grid = trips_grid(config);
    grid.mount().await;

    grid.toggle_row(&RowId::from(1));
    grid.toggle_row(&RowId::from(3));

    assert_eq!(grid.selected_ids(), ids(&[3]));
    assert!(!grid.select_all());
}

#[tokio::test]
async fn selection_survives_sorting_and_paging() {
    let config = GridConfig {
        page_size: 3,
        ..GridConfig::new("trips")
    };
    let mut grid = trips_grid(config);
    grid.mount().await;
    grid.toggle_row(&RowId::from(2));

    grid.sort_by("stops", smartgrid_core::SortDirection::Descending)
        .await
        .unwrap();
    grid.next_page();

    assert_eq!(grid.selected_ids(), ids(&[2]));
}

#[tokio::test]
async fn select_all_covers_every_filtered_page() {
    let config = GridConfig {
        page_size: 2,
        ..GridConfig::new("trips")
    };
    let mut grid = trips_grid(config);
    grid.mount().await;
    grid.set_quick_filter("status", "active");

    assert!(grid.select_all());
    assert_eq!(grid.selected_ids(), ids(&[2, 4, 7]));

    grid.clear_selection();
    assert!(grid.selected_ids().is_empty());
}

#[tokio::test]
async fn replaced_dataset_drops_missing_selections() {
    let mut grid = trips_grid(GridConfig::new("trips"));
    grid.mount().await;
    grid.toggle_row(&RowId::from(1));
    grid.toggle_row(&RowId::from(8));
    grid.take_events();

    grid.set_rows(trip_rows()[..4].to_vec());

    assert_eq!(grid.selected_ids(), ids(&[1]));
    assert_eq!(
        grid.take_events(),
        vec![GridEvent::SelectionChanged(ids(&[1]))]
    );
}

#[tokio::test]
async fn remount_seeds_default_again() {
    let config = GridConfig {
        default_selection: Some(DefaultSelection::Indices(vec![1])),
        ..GridConfig::new("trips")
    };
    let mut grid = trips_grid(config);
    grid.mount().await;
    grid.toggle_row(&RowId::from(5));

    grid.unmount();
    assert!(grid.selected_ids().is_empty());
    grid.mount().await;

    assert_eq!(grid.selected_ids(), ids(&[2]));
}

// ============ Nested rows ============

#[tokio::test]
async fn aggregates_are_computed_on_load() {
    let mut grid = order_grid(false, NestedScope::Global);
    grid.mount().await;

    let order = grid.row(&RowId::from(1)).unwrap();
    assert_eq!(order.value("order_total"), &Value::Int(56));
    assert_eq!(order.nested("items").unwrap()[0].value("total"), &Value::Int(50));
    assert_eq!(
        grid.nested_ids(&RowId::from(1)),
        vec![RowId::from("A-1"), RowId::from("B-2")]
    );
}

#[tokio::test]
async fn nested_edit_recomputes_line_and_parent() {
    let mut grid = order_grid(true, NestedScope::Global);
    grid.mount().await;

    let address = CellAddress::nested(RowId::from(1), "items", RowId::from("A-1"), "qty");
    grid.begin_edit(address).unwrap();
    grid.set_edit_draft(Value::from(20)).unwrap();
    grid.commit_edit().await.unwrap();

    let order = grid.row(&RowId::from(1)).unwrap();
    assert_eq!(order.nested("items").unwrap()[0].value("total"), &Value::Int(100));
    assert_eq!(order.value("order_total"), &Value::Int(106));
}

#[tokio::test]
async fn invalid_nested_edit_is_rolled_back() {
    let mut grid = order_grid(true, NestedScope::Global);
    grid.mount().await;

    let qty = CellAddress::nested(RowId::from(1), "items", RowId::from("A-1"), "qty");
    grid.begin_edit(qty.clone()).unwrap();
    grid.set_edit_draft(Value::from("")).unwrap();
    let err = grid.commit_edit().await.unwrap_err();
    let GridError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert_eq!(errors.get("qty"), Some("Qty is required"));
    assert_eq!(grid.editing().map(|e| e.address.clone()), Some(qty));

    let note = CellAddress::nested(RowId::from(1), "items", RowId::from("B-2"), "note");
    grid.begin_edit(note).unwrap();
    grid.set_edit_draft(Value::from("fragile, handle with care")).unwrap();
    assert!(matches!(grid.commit_edit().await, Err(GridError::Validation(_))));

    let order = grid.row(&RowId::from(1)).unwrap();
    let items = order.nested("items").unwrap();
    assert_eq!(items[0].value("qty"), &Value::Int(10));
    assert_eq!(items[0].value("total"), &Value::Int(50));
    assert!(items[1].value("note").is_empty());
    assert_eq!(order.value("order_total"), &Value::Int(56));
    assert!(!grid.take_events().iter().any(|e| matches!(e, GridEvent::RowEdited(_))));
}

#[tokio::test]
async fn nested_toggles_report_the_nested_selection() {
    let mut grid = order_grid(true, NestedScope::Global);
    grid.mount().await;
    grid.take_events();
    let first = RowId::from(1);

    grid.toggle_nested_row(&first, &RowId::from("A-1"));
    grid.toggle_nested_row(&RowId::from(2), &RowId::from("C-3"));
    grid.toggle_nested_row(&first, &RowId::from("A-1"));

    let reported: Vec<Vec<(RowId, RowId)>> = grid
        .take_events()
        .into_iter()
        .filter_map(|e| match e {
            GridEvent::NestedSelectionChanged(pairs) => Some(pairs),
            _ => None,
        })
        .collect();
    assert_eq!(
        reported,
        vec![
            vec![(first.clone(), RowId::from("A-1"))],
            vec![
                (first.clone(), RowId::from("A-1")),
                (RowId::from(2), RowId::from("C-3"))
            ],
            vec![(RowId::from(2), RowId::from("C-3"))],
        ]
    );
    assert_eq!(
        grid.selected_nested_rows(),
        vec![(RowId::from(2), RowId::from("C-3"))]
    );
}

#[tokio::test]
async fn nested_toggle_without_nested_selection_is_silent() {
    let mut plain = trips_grid(GridConfig::new("trips"));
    plain.mount().await;
    plain.take_events();
    assert!(!plain.toggle_nested_row(&RowId::from(1), &RowId::from("x")));
    assert!(plain.take_events().is_empty());
}

#[tokio::test]
async fn nested_selection_within_parent() {
    let mut grid = order_grid(true, NestedScope::WithinParent);
    grid.mount().await;
    let (first, second) = (RowId::from(1), RowId::from(2));

    assert!(grid.toggle_nested_row(&first, &RowId::from("A-1")));
    assert!(grid.toggle_nested_row(&first, &RowId::from("B-2")));
    assert!(grid.toggle_nested_row(&second, &RowId::from("C-3")));

    assert!(grid.is_nested_row_selected(&second, &RowId::from("C-3")));
    assert!(!grid.is_nested_row_selected(&first, &RowId::from("A-1")));
    assert!(!grid.is_nested_row_selected(&first, &RowId::from("B-2")));
}

// ============ Expansion ============

#[tokio::test]
async fn rows_without_children_never_expand() {
    let mut grid = order_grid(false, NestedScope::Global);
    grid.mount().await;
    let empty = RowId::from(3);

    assert!(!grid.is_expandable(&empty));
    assert!(!grid.toggle_expanded(&empty));
    assert!(!grid.is_expanded(&empty));
}

#[tokio::test]
async fn expand_and_collapse_all() {
    let mut grid = order_grid(false, NestedScope::Global);
    grid.mount().await;
    let order = RowId::from(1);

    assert!(grid.toggle_expanded(&order));
    assert!(grid.is_expanded(&order));
    assert!(!grid.toggle_expanded(&order));

    grid.expand_all();
    assert!(grid.is_expanded(&order));
    assert!(grid.is_expanded(&RowId::from(2)));

    grid.collapse_all();
    assert!(!grid.is_expanded(&order));
}

#[tokio::test]
async fn disabling_sub_rows_collapses_everything() {
    let mut grid = order_grid(true, NestedScope::Global);
    grid.mount().await;
    assert!(grid.is_expanded(&RowId::from(1)));

    grid.set_sub_rows_enabled(false).await;
    assert!(!grid.is_expandable(&RowId::from(1)));
    assert!(!grid.is_expanded(&RowId::from(1)));

    grid.set_sub_rows_enabled(true).await;
    assert!(!grid.is_expanded(&RowId::from(1)));
}

#[tokio::test]
async fn sub_row_columns_follow_preferences() {
    let mut grid = order_grid(true, NestedScope::Global);
    grid.mount().await;
    assert_eq!(grid.sub_row_columns().len(), 5);

    grid.set_sub_row_columns(vec!["sku".into(), "total".into()]).await;

    let keys: Vec<&str> = grid.sub_row_columns().iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, vec!["sku", "total"]);
}
