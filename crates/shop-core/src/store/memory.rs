//! # In-Memory Record Store
//!
//! `RecordStore` kept in process memory. Used by the test suites;
//! mirrors the PostgREST behaviour the core relies on
//! (generated ids, `created_at` defaults, unique columns, embedded joins).

use super::{value_key, Filter, Join, JoinKind, RecordStore, Row, Table};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Record store backed by in-process tables
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
    unique: Vec<(Table, &'static str)>,
    writes: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryStore {
    /// Empty store with the storefront's unique constraints (`users.email`)
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            unique: vec![(Table::Users, "email")],
            writes: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Number of successful insert/update/delete calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Seed a row directly, bypassing write accounting
    pub fn seed(&self, table: Table, row: Row) -> StoreResult<Row> {
        let mut tables = self.write_lock()?;
        let row = with_defaults(row);
        tables.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }

    fn read_lock(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<Table, Vec<Row>>>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write_lock(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, HashMap<Table, Vec<Row>>>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn check_unique(
        &self,
        table: Table,
        rows: &[Row],
        candidate: &Row,
        skip: Option<usize>,
    ) -> StoreResult<()> {
        for (t, column) in &self.unique {
            if *t != table {
                continue;
            }
            let Some(value) = candidate.get(*column).and_then(value_key) else {
                continue;
            };
            let clash = rows.iter().enumerate().any(|(i, existing)| {
                Some(i) != skip
                    && existing.get(*column).and_then(value_key).as_deref() == Some(value.as_str())
            });
            if clash {
                return Err(StoreError::Conflict(format!(
                    "duplicate key value violates unique constraint \"{}_{}_key\"",
                    table, column
                )));
            }
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn with_defaults(mut row: Row) -> Row {
    if !row.contains_key("id") {
        row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    }
    if !row.contains_key("created_at") {
        row.insert("created_at".to_string(), Value::String(Utc::now().to_rfc3339()));
    }
    row
}

fn require_filter(table: Table, filter: &Filter) -> StoreResult<()> {
    if filter.is_empty() {
        return Err(StoreError::Backend {
            code: "21000".to_string(),
            message: format!("{} requires a WHERE clause", table),
        });
    }
    Ok(())
}

/// Embed `joins` into `row`, a row of `table`
fn resolve_joins(
    tables: &HashMap<Table, Vec<Row>>,
    table: Table,
    row: &Row,
    joins: &[Join],
) -> Row {
    let mut out = row.clone();
    for join in joins {
        let target = tables.get(&join.table).map(Vec::as_slice).unwrap_or(&[]);
        let embedded = match join.kind {
            JoinKind::One => row
                .get(join.table.foreign_key())
                .and_then(value_key)
                .and_then(|fk| {
                    target
                        .iter()
                        .find(|r| r.get("id").and_then(value_key).as_deref() == Some(fk.as_str()))
                })
                .map(|r| Value::Object(resolve_joins(tables, join.table, r, &join.nested)))
                .unwrap_or(Value::Null),
            JoinKind::Many => {
                let parent = row.get("id").and_then(value_key);
                let children = target
                    .iter()
                    .filter(|r| {
                        parent.is_some()
                            && r.get(table.foreign_key()).and_then(value_key) == parent
                    })
                    .map(|r| Value::Object(resolve_joins(tables, join.table, r, &join.nested)))
                    .collect();
                Value::Array(children)
            }
        };
        out.insert(join.alias.clone(), embedded);
    }
    out
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn query(&self, table: Table, filter: &Filter, joins: &[Join]) -> StoreResult<Vec<Row>> {
        self.ensure_online()?;
        let tables = self.read_lock()?;
        let rows = tables
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| filter.matches(r))
                    .map(|r| resolve_joins(&tables, table, r, joins))
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row> {
        self.ensure_online()?;
        let mut tables = self.write_lock()?;
        let rows = tables.entry(table).or_default();
        let row = with_defaults(row);
        self.check_unique(table, rows, &row, None)?;
        rows.push(row.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!(table = %table, "memory insert");
        Ok(row)
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Row) -> StoreResult<Vec<Row>> {
        self.ensure_online()?;
        require_filter(table, filter)?;
        let mut tables = self.write_lock()?;
        let rows = tables.entry(table).or_default();

        let targets: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| filter.matches(r))
            .map(|(i, _)| i)
            .collect();

        // all or nothing: patch a copy, check it, then swap it in
        let mut staged = rows.clone();
        for &i in &targets {
            for (k, v) in &patch {
                staged[i].insert(k.clone(), v.clone());
            }
        }
        for &i in &targets {
            self.check_unique(table, &staged, &staged[i], Some(i))?;
        }

        let updated = targets.iter().map(|&i| staged[i].clone()).collect();
        *rows = staged;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> StoreResult<u64> {
        self.ensure_online()?;
        require_filter(table, filter)?;
        let mut tables = self.write_lock()?;
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        let removed = (before - rows.len()) as u64;

        // carts own their items
        if table == Table::Carts && removed > 0 {
            let live: Vec<String> = tables
                .get(&Table::Carts)
                .map(|carts| carts.iter().filter_map(|c| c.get("id").and_then(value_key)).collect())
                .unwrap_or_default();
            if let Some(items) = tables.get_mut(&Table::CartItems) {
                items.retain(|item| {
                    item.get("cart_id")
                        .and_then(value_key)
                        .map(|cart_id| live.contains(&cart_id))
                        .unwrap_or(false)
                });
            }
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
