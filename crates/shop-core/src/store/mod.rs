//! # Record Store Trait
//!
//! The narrow capability the storefront core persists through.
//! Implementations: `PostgrestStore` (shop-postgrest), `MemoryStore`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RecordStore (trait)                     │
//! │  ├── query(table, filter, joins)                            │
//! │  ├── get(table, id, joins)                                  │
//! │  ├── insert(table, row)                                     │
//! │  ├── update(table, filter, patch)                           │
//! │  └── delete(table, filter)                                  │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                  ┌─────────┴─────────┐
//!          ┌───────┴───────┐   ┌───────┴───────┐
//!          │ PostgrestStore│   │  MemoryStore  │
//!          └───────────────┘   └───────────────┘
//! ```
//!
//! Filters are equality predicates only. Joins are declarative and follow
//! the `<singular>_id` foreign-key convention of the schema.

mod memory;

pub use memory::MemoryStore;

use crate::error::{ShopError, ShopResult, StoreError, StoreResult};
use crate::id::RecordId;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::error;

/// A single record as exchanged with the store
pub type Row = serde_json::Map<String, Value>;

/// Tables of the storefront schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Products,
    Carts,
    CartItems,
    Orders,
}

impl Table {
    /// Table name in the store
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Products => "products",
            Table::Carts => "carts",
            Table::CartItems => "cart_items",
            Table::Orders => "orders",
        }
    }

    /// Column other tables use to reference this one
    pub fn foreign_key(&self) -> &'static str {
        match self {
            Table::Users => "user_id",
            Table::Products => "product_id",
            Table::Carts => "cart_id",
            Table::CartItems => "cart_item_id",
            Table::Orders => "order_id",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conjunction of `column = value` predicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, String)>,
}

impl Filter {
    /// Empty filter (matches every row)
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on the primary key
    pub fn by_id(id: &RecordId) -> Self {
        Self::new().eq("id", id)
    }

    /// Builder: add an equality predicate
    pub fn eq(mut self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.conditions.push((column.into(), value.to_string()));
        self
    }

    pub fn conditions(&self) -> &[(String, String)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter against a row
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            row.get(column)
                .and_then(value_key)
                .map(|actual| actual == *expected)
                .unwrap_or(false)
        })
    }
}

/// Render a scalar JSON value the way filters compare it
pub fn value_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Cardinality of an embedded relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// This row holds `<target>_id`; embeds one row or null
    One,
    /// Target rows hold `<this>_id`; embeds an array
    Many,
}

/// Declarative embedding of related rows under `alias`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub alias: String,
    pub table: Table,
    pub kind: JoinKind,
    pub nested: Vec<Join>,
}

impl Join {
    pub fn one(alias: impl Into<String>, table: Table) -> Self {
        Self {
            alias: alias.into(),
            table,
            kind: JoinKind::One,
            nested: Vec::new(),
        }
    }

    pub fn many(alias: impl Into<String>, table: Table) -> Self {
        Self {
            alias: alias.into(),
            table,
            kind: JoinKind::Many,
            nested: Vec::new(),
        }
    }

    /// Builder: embed a relation of the joined table
    pub fn with(mut self, join: Join) -> Self {
        self.nested.push(join);
        self
    }
}

/// PostgREST `select` expression for a set of joins
/// (`*,alias:table(*,...)`).
pub fn select_clause(joins: &[Join]) -> String {
    let mut clause = String::from("*");
    for join in joins {
        clause.push_str(&format!(
            ",{}:{}({})",
            join.alias,
            join.table.as_str(),
            select_clause(&join.nested)
        ));
    }
    clause
}

/// Core trait for record store implementations.
///
/// The store is the system of record; the core never caches rows between
/// calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Rows of `table` matching `filter`, with `joins` embedded.
    async fn query(&self, table: Table, filter: &Filter, joins: &[Join]) -> StoreResult<Vec<Row>>;

    /// Single row by primary key, or `None`.
    async fn get(&self, table: Table, id: &RecordId, joins: &[Join]) -> StoreResult<Option<Row>> {
        let rows = self.query(table, &Filter::by_id(id), joins).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert a row and return it as persisted (ids and defaults filled).
    async fn insert(&self, table: Table, row: Row) -> StoreResult<Row>;

    /// Apply `patch` to all rows matching `filter`; returns the updated rows.
    async fn update(&self, table: Table, filter: &Filter, patch: Row) -> StoreResult<Vec<Row>>;

    /// Delete rows matching `filter`; returns the affected count.
    async fn delete(&self, table: Table, filter: &Filter) -> StoreResult<u64>;

    /// Backend name (for logging).
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared record store (dynamic dispatch)
pub type BoxedRecordStore = Arc<dyn RecordStore>;

/// Deserialize a store row into a domain type
pub fn decode<T: DeserializeOwned>(table: Table, row: Row) -> ShopResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        ShopError::StoreFailure(format!("Malformed {} row: {}", table, e))
    })
}

/// Deserialize many store rows
pub fn decode_all<T: DeserializeOwned>(table: Table, rows: Vec<Row>) -> ShopResult<Vec<T>> {
    rows.into_iter().map(|row| decode(table, row)).collect()
}

/// Serialize a domain value into a store row
pub fn encode<T: Serialize>(value: &T) -> ShopResult<Row> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ShopError::Internal(format!(
            "Expected an object row, got {}",
            other
        ))),
        Err(e) => Err(ShopError::Internal(format!("Row encode failed: {}", e))),
    }
}

/// Log a store failure and translate it into the core taxonomy
pub fn store_failure(context: &'static str) -> impl Fn(StoreError) -> ShopError {
    move |err| {
        error!(context, error = %err, "store call failed");
        ShopError::from(err)
    }
}
