pub mod memory;
pub mod rest;
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use rest::{RestConfig, RestStore};
pub use sqlite::SqliteStore;

/// A row as it crosses the store boundary.
pub type Row = serde_json::Value;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    CourseTypes,
    Courses,
    Offerings,
    Registrations,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::CourseTypes => "course_types",
            Table::Courses => "courses",
            Table::Offerings => "offerings",
            Table::Registrations => "registrations",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    #[serde(rename = "*")]
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
}

/// Subscription filter; `ChangeKind::All` matches every kind on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watch {
    pub table: Table,
    pub kind: ChangeKind,
}

impl Watch {
    pub fn all(table: Table) -> Self {
        Self {
            table,
            kind: ChangeKind::All,
        }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.table == event.table && (self.kind == ChangeKind::All || self.kind == event.kind)
    }
}

/// Fan-out of change events to every subscribed panel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, table: Table, kind: ChangeKind) {
        // An error only means nobody is listening.
        if self.tx.send(ChangeEvent { table, kind }).is_err() {
            debug!("no listeners for {:?} on {}", kind, table);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Remote tabular persistence backing every panel.
///
/// `update` applies a patch: keys absent from `patch` keep their stored
/// value. Updating or deleting an id that does not exist is
/// `StoreError::NotFound`. Every successful mutation is announced on the
/// channel returned by `subscribe`.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn select(&self, table: Table) -> Result<Vec<Row>, StoreError>;
    async fn insert(&self, table: Table, fields: Row) -> Result<Row, StoreError>;
    async fn update(&self, table: Table, id: i64, patch: Row) -> Result<Row, StoreError>;
    async fn delete(&self, table: Table, id: i64) -> Result<(), StoreError>;
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

pub async fn list<T: DeserializeOwned>(
    store: &dyn EntityStore,
    table: Table,
) -> Result<Vec<T>, StoreError> {
    store
        .select(table)
        .await?
        .into_iter()
        .map(|row| decode(table, row))
        .collect()
}

pub fn decode<T: DeserializeOwned>(table: Table, row: Row) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|source| StoreError::Codec { table, source })
}

pub fn encode<T: Serialize>(table: Table, fields: &T) -> Result<Row, StoreError> {
    serde_json::to_value(fields).map_err(|source| StoreError::Codec { table, source })
}
