//! Integration tests for saved filter sets on a mounted grid

mod common;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use smartgrid_core::{FilterCondition, FilterValue, NoticeLevel, Value, ValueType};
use smartgrid_engine::{
    FilterSet, FilterSetApi, GridAction, GridConfig, GridEvent, SmartGrid, SqliteFilterSetStore,
};
use smartgrid_settings::GridPreferences;

use common::{MockFilterSetApi, MockPreferenceStore, ids, trip_columns, trip_rows};

fn stored_set(id: &str, name: &str, status: &str, is_default: bool) -> FilterSet {
    let mut filters = IndexMap::new();
    filters.insert("status".to_string(), FilterValue::Single(Value::from(status)));
    let now = chrono::Utc::now();
    FilterSet {
        id: id.to_string(),
        owner: "local".to_string(),
        grid_id: "trips".to_string(),
        name: name.to_string(),
        filters,
        is_default,
        created_at: now,
        updated_at: now,
    }
}

fn grid_with(api: Arc<dyn FilterSetApi>, store: Arc<MockPreferenceStore>) -> SmartGrid {
    SmartGrid::builder(GridConfig::new("trips"))
        .columns(trip_columns())
        .rows(trip_rows())
        .preference_store(store)
        .filter_set_api(api)
        .build()
}

#[tokio::test]
async fn default_set_applies_on_mount() {
    let api = Arc::new(MockFilterSetApi::new().with_set(stored_set("s1", "Active", "active", true)));
    let mut grid = grid_with(api, Arc::new(MockPreferenceStore::new()));

    grid.mount().await;

    assert_eq!(grid.processed_ids(), ids(&[2, 4, 7]));
    assert!(grid.take_events().contains(&GridEvent::FilterSetApplied {
        id: "s1".to_string(),
        name: "Active".to_string(),
    }));
}

#[tokio::test]
async fn default_set_applies_once_per_mount() {
    let api = Arc::new(MockFilterSetApi::new().with_set(stored_set("s1", "Active", "active", true)));
    let mut grid = grid_with(api, Arc::new(MockPreferenceStore::new()));
    grid.mount().await;

    grid.clear_filters().await;
    grid.load_filter_sets().await;

    assert_eq!(grid.processed_count(), 8);
    assert_eq!(grid.filter_sets().len(), 1);
}

#[tokio::test]
async fn stored_filters_win_over_default_set() {
    let api = Arc::new(MockFilterSetApi::new().with_set(stored_set("s1", "Active", "active", true)));
    let preferences = GridPreferences {
        active_filters: vec![FilterCondition::new(
            "status",
            ValueType::Select,
            FilterValue::Single(Value::from("done")),
        )],
        ..GridPreferences::defaults_for(&trip_columns(), 25)
    };
    let store = Arc::new(MockPreferenceStore::new().with_preferences(preferences));
    let mut grid = grid_with(api, store);

    grid.mount().await;

    assert_eq!(grid.processed_ids(), ids(&[3, 6]));
    assert!(!grid
        .take_events()
        .iter()
        .any(|e| matches!(e, GridEvent::FilterSetApplied { .. })));
}

#[tokio::test]
async fn apply_then_clear_returns_baseline() {
    let api = Arc::new(
        MockFilterSetApi::new()
            .with_set(stored_set("s1", "Planned", "planned", false))
            .with_set(stored_set("s2", "Done", "done", false)),
    );
    let mut grid = grid_with(api, Arc::new(MockPreferenceStore::new()));
    grid.mount().await;
    let baseline = grid.processed_ids();

    let applied = grid.apply_filter_set("s1").await.unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(grid.processed_ids(), ids(&[1, 5, 8]));
    assert_eq!(
        grid.filter_panel().value("status"),
        Some(&FilterValue::Single(Value::from("planned")))
    );

    grid.clear_filters().await;
    assert_eq!(grid.processed_ids(), baseline);
}

#[tokio::test]
async fn unknown_set_is_not_found() {
    let api = Arc::new(MockFilterSetApi::new());
    let mut grid = grid_with(api, Arc::new(MockPreferenceStore::new()));
    grid.mount().await;

    assert!(grid.apply_filter_set("missing").await.is_err());
}

#[tokio::test]
async fn save_rename_and_delete_with_sqlite_store() {
    let api = Arc::new(SqliteFilterSetStore::in_memory().unwrap());
    let mut grid = grid_with(api, Arc::new(MockPreferenceStore::new()));
    grid.mount().await;

    grid.set_filter_value("status", Value::from("active")).unwrap();
    let saved = grid.save_filter_set("Busy days", false).await.unwrap().unwrap();
    assert_eq!(saved.owner, "local");
    assert_eq!(
        saved.filters.get("status"),
        Some(&FilterValue::Single(Value::from("active")))
    );

    assert!(grid.rename_filter_set(&saved.id, "Active trips").await.unwrap());
    assert_eq!(grid.filter_sets()[0].name, "Active trips");

    grid.set_filter_value("status", Value::from("done")).unwrap();
    assert!(grid.update_filter_set(&saved.id).await.unwrap());
    assert_eq!(
        grid.filter_sets()[0].filters.get("status"),
        Some(&FilterValue::Single(Value::from("done")))
    );

    assert!(grid.delete_filter_set(&saved.id).await.unwrap());
    assert!(grid.filter_sets().is_empty());
}

#[tokio::test]
async fn only_one_default_set() {
    let api = Arc::new(SqliteFilterSetStore::in_memory().unwrap());
    let mut grid = grid_with(api, Arc::new(MockPreferenceStore::new()));
    grid.mount().await;

    grid.set_filter_value("status", Value::from("active")).unwrap();
    let first = grid.save_filter_set("First", true).await.unwrap().unwrap();
    let second = grid.save_filter_set("Second", false).await.unwrap().unwrap();
    assert!(grid.set_default_filter_set(&second.id).await.unwrap());

    let defaults: Vec<&str> = grid
        .filter_sets()
        .iter()
        .filter(|s| s.is_default)
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(defaults, vec![second.id.as_str()]);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn blank_name_is_rejected_with_notice() {
    let api = Arc::new(MockFilterSetApi::new());
    let mut grid = grid_with(api.clone(), Arc::new(MockPreferenceStore::new()));
    grid.mount().await;
    grid.take_notices();

    assert_eq!(grid.save_filter_set("   ", false).await.unwrap(), None);

    let notices = grid.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert_eq!(api.call_log(), vec!["get"]);
}

#[tokio::test]
async fn failing_api_keeps_grid_usable() {
    let api = Arc::new(MockFilterSetApi::new().with_failure());
    let mut grid = grid_with(api, Arc::new(MockPreferenceStore::new()));
    grid.mount().await;

    assert!(grid.filter_sets().is_empty());
    assert_eq!(grid.processed_count(), 8);
    assert_eq!(grid.take_notices().len(), 1);

    grid.set_filter_value("status", Value::from("active")).unwrap();
    assert_eq!(grid.save_filter_set("Active", false).await.unwrap(), None);
    assert_eq!(grid.take_notices()[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn concurrent_save_is_busy() {
    let api = Arc::new(MockFilterSetApi::new());
    let mut grid = grid_with(api.clone(), Arc::new(MockPreferenceStore::new()));
    grid.mount().await;
    grid.set_filter_value("status", Value::from("active")).unwrap();

    grid.begin_action(GridAction::SaveFilterSet).unwrap();
    assert!(grid.save_filter_set("Active", false).await.is_err());
    grid.finish_action(GridAction::SaveFilterSet);

    assert!(grid.save_filter_set("Active", false).await.unwrap().is_some());
    assert_eq!(api.call_log(), vec!["get", "save"]);
}

#[tokio::test]
async fn grid_without_filter_set_api_reports_it() {
    let mut grid = SmartGrid::builder(GridConfig::new("trips"))
        .columns(trip_columns())
        .rows(trip_rows())
        .preference_store(Arc::new(MockPreferenceStore::new()))
        .build();
    grid.mount().await;
    grid.take_notices();

    assert_eq!(grid.save_filter_set("Anything", false).await.unwrap(), None);
    assert_eq!(grid.take_notices().len(), 1);
}
