//! Filter set storage using SQLite
//!
//! The client-local implementation of `FilterSetApi`. Setting a default
//! clears every other default of the same (owner, grid) inside one
//! transaction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use smartgrid_core::{FilterValue, GridError, GridResult};

use super::types::{FilterSet, FilterSetApi, FilterSetPatch, NewFilterSet};

/// Handle for database connections - either owned or shared
enum ConnectionHandle {
    Owned(Connection),
    Shared(Arc<Mutex<Connection>>),
}

impl ConnectionHandle {
    fn with_conn<T, F: FnOnce(&Connection) -> Result<T>>(&self, f: F) -> Result<T> {
        match self {
            ConnectionHandle::Owned(conn) => f(conn),
            ConnectionHandle::Shared(shared) => {
                let guard = shared.lock();
                f(&guard)
            }
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, owner, grid_id, name, filters_json, is_default, created_at, updated_at";

/// Storage for filter sets using SQLite
pub struct SqliteFilterSetStore {
    db_path: PathBuf,
    /// Holds the connection for in-memory databases (where each open creates a new db)
    memory_conn: Option<Arc<Mutex<Connection>>>,
}

impl SqliteFilterSetStore {
    /// Open or create storage at the given path
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let storage = Self {
            db_path,
            memory_conn: None,
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    /// Open storage in the user data directory
    pub fn open_default() -> Result<Self> {
        Self::open(smartgrid_settings::filter_sets_db_file()?)
    }

    /// Create an in-memory storage for testing
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().with_context(|| "Failed to create in-memory database")?;
        let storage = Self {
            db_path: PathBuf::from(":memory:"),
            memory_conn: Some(Arc::new(Mutex::new(conn))),
        };
        storage.initialize_schema()?;
        Ok(storage)
    }

    fn connect(&self) -> Result<ConnectionHandle> {
        if let Some(ref conn) = self.memory_conn {
            Ok(ConnectionHandle::Shared(conn.clone()))
        } else {
            let conn = Connection::open(&self.db_path)
                .with_context(|| format!("Failed to open database at {:?}", self.db_path))?;
            Ok(ConnectionHandle::Owned(conn))
        }
    }

    fn initialize_schema(&self) -> Result<()> {
        let handle = self.connect()?;
        handle.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS filter_sets (
                    id TEXT PRIMARY KEY,
                    owner TEXT NOT NULL,
                    grid_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    filters_json TEXT NOT NULL DEFAULT '{}',
                    is_default INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                )",
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_filter_sets_owner_grid
                 ON filter_sets(owner, grid_id)",
                [],
            )?;
            Ok(())
        })
    }

    /// Insert a new filter set and return it with its generated id
    pub fn insert(&self, new_set: &NewFilterSet) -> Result<FilterSet> {
        let now = Utc::now();
        let set = FilterSet {
            id: Uuid::new_v4().to_string(),
            owner: new_set.owner.clone(),
            grid_id: new_set.grid_id.clone(),
            name: new_set.name.clone(),
            filters: new_set.filters.clone(),
            is_default: new_set.is_default,
            created_at: now,
            updated_at: now,
        };
        let filters_json = serde_json::to_string(&set.filters)?;

        let handle = self.connect()?;
        handle.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            if set.is_default {
                clear_defaults(&tx, &set.owner, &set.grid_id, &set.id)?;
            }
            tx.execute(
                "INSERT INTO filter_sets
                 (id, owner, grid_id, name, filters_json, is_default, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    set.id,
                    set.owner,
                    set.grid_id,
                    set.name,
                    filters_json,
                    set.is_default as i32,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )?;
            tx.commit()?;
            Ok(())
        })?;
        Ok(set)
    }

    /// Load a filter set by ID
    pub fn get(&self, id: &str) -> Result<Option<FilterSet>> {
        let handle = self.connect()?;
        handle.with_conn(|conn| fetch_one(conn, id))
    }

    /// List all filter sets of an owner for a grid, by name
    pub fn list(&self, owner: &str, grid_id: &str) -> Result<Vec<FilterSet>> {
        let handle = self.connect()?;
        handle.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM filter_sets WHERE owner = ?1 AND grid_id = ?2 ORDER BY name ASC",
                SELECT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![owner, grid_id], read_stored)?;

            let mut result = Vec::new();
            for row in rows {
                result.push(row?.into_filter_set()?);
            }
            Ok(result)
        })
    }

    /// Apply a patch. Returns `None` when the id does not exist.
    pub fn update(&self, id: &str, patch: &FilterSetPatch) -> Result<Option<FilterSet>> {
        let handle = self.connect()?;
        handle.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let Some(mut set) = fetch_one(&tx, id)? else {
                return Ok(None);
            };

            if let Some(name) = &patch.name {
                set.name = name.clone();
            }
            if let Some(filters) = &patch.filters {
                set.filters = filters.clone();
            }
            if let Some(is_default) = patch.is_default {
                set.is_default = is_default;
            }
            set.updated_at = Utc::now();

            if set.is_default {
                clear_defaults(&tx, &set.owner, &set.grid_id, &set.id)?;
            }
            tx.execute(
                "UPDATE filter_sets
                 SET name = ?2, filters_json = ?3, is_default = ?4, updated_at = ?5
                 WHERE id = ?1",
                params![
                    set.id,
                    set.name,
                    serde_json::to_string(&set.filters)?,
                    set.is_default as i32,
                    set.updated_at.to_rfc3339(),
                ],
            )?;
            tx.commit()?;
            Ok(Some(set))
        })
    }

    /// Delete a filter set by ID
    pub fn delete(&self, id: &str) -> Result<bool> {
        let handle = self.connect()?;
        handle.with_conn(|conn| {
            let rows = conn.execute("DELETE FROM filter_sets WHERE id = ?1", params![id])?;
            Ok(rows > 0)
        })
    }
}

fn clear_defaults(conn: &Connection, owner: &str, grid_id: &str, except: &str) -> Result<()> {
    conn.execute(
        "UPDATE filter_sets SET is_default = 0
         WHERE owner = ?1 AND grid_id = ?2 AND id != ?3 AND is_default != 0",
        params![owner, grid_id, except],
    )?;
    Ok(())
}

fn fetch_one(conn: &Connection, id: &str) -> Result<Option<FilterSet>> {
    let stored = conn
        .query_row(
            &format!("SELECT {} FROM filter_sets WHERE id = ?1", SELECT_COLUMNS),
            params![id],
            read_stored,
        )
        .optional()?;
    stored.map(StoredFilterSet::into_filter_set).transpose()
}

/// Raw row as read from SQLite
struct StoredFilterSet {
    id: String,
    owner: String,
    grid_id: String,
    name: String,
    filters_json: String,
    is_default: i32,
    created_at: String,
    updated_at: String,
}

fn read_stored(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredFilterSet> {
    Ok(StoredFilterSet {
        id: row.get(0)?,
        owner: row.get(1)?,
        grid_id: row.get(2)?,
        name: row.get(3)?,
        filters_json: row.get(4)?,
        is_default: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl StoredFilterSet {
    fn into_filter_set(self) -> Result<FilterSet> {
        let filters: IndexMap<String, FilterValue> = match serde_json::from_str(&self.filters_json)
        {
            Ok(filters) => filters,
            Err(err) => {
                tracing::warn!(id = %self.id, "Unreadable filters in stored filter set: {}", err);
                IndexMap::new()
            }
        };
        Ok(FilterSet {
            filters,
            is_default: self.is_default != 0,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            owner: self.owner,
            grid_id: self.grid_id,
            name: self.name,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp '{}'", raw))
}

#[async_trait]
impl FilterSetApi for SqliteFilterSetStore {
    async fn get_user_filter_sets(&self, owner: &str, grid_id: &str) -> GridResult<Vec<FilterSet>> {
        Ok(self.list(owner, grid_id)?)
    }

    async fn save_user_filter_set(&self, set: NewFilterSet) -> GridResult<FilterSet> {
        Ok(self.insert(&set)?)
    }

    async fn update_filter_set(&self, id: &str, patch: FilterSetPatch) -> GridResult<FilterSet> {
        self.update(id, &patch)?
            .ok_or_else(|| GridError::NotFound(format!("filter set '{}'", id)))
    }

    async fn delete_filter_set(&self, id: &str) -> GridResult<()> {
        if self.delete(id)? {
            Ok(())
        } else {
            Err(GridError::NotFound(format!("filter set '{}'", id)))
        }
    }
}
