use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use super::{ChangeEvent, ChangeFeed, ChangeKind, EntityStore, Row, Table};
use crate::error::StoreError;

#[derive(Default)]
struct MemoryTable {
    last_id: i64,
    rows: BTreeMap<i64, Map<String, Value>>,
}

/// In-process store with auto-increment ids, used by tests and the
/// `memory` backend. No foreign keys are checked.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, MemoryTable>>,
    failures: Mutex<VecDeque<String>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store call fail with `StoreError::Rejected`.
    pub fn fail_next(&self, message: impl Into<String>) {
        lock(&self.failures).push_back(message.into());
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match lock(&self.failures).pop_front() {
            Some(message) => Err(StoreError::Rejected(message)),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn into_object(row: Row) -> Result<Map<String, Value>, StoreError> {
    match row {
        Value::Object(mut map) => {
            map.remove("id");
            Ok(map)
        }
        other => Err(StoreError::Rejected(format!("expected an object, got {}", other))),
    }
}

fn with_id(id: i64, fields: &Map<String, Value>) -> Row {
    let mut row = Map::with_capacity(fields.len() + 1);
    row.insert("id".to_string(), Value::from(id));
    row.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
    Value::Object(row)
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn select(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        self.check_failure()?;
        let tables = lock(&self.tables);
        Ok(tables
            .get(&table)
            .map(|t| t.rows.iter().map(|(id, fields)| with_id(*id, fields)).collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, fields: Row) -> Result<Row, StoreError> {
        self.check_failure()?;
        let fields = into_object(fields)?;
        let row = {
            let mut tables = lock(&self.tables);
            let entry = tables.entry(table).or_default();
            entry.last_id += 1;
            let id = entry.last_id;
            let row = with_id(id, &fields);
            entry.rows.insert(id, fields);
            row
        };
        self.feed.publish(table, ChangeKind::Insert);
        Ok(row)
    }

    async fn update(&self, table: Table, id: i64, patch: Row) -> Result<Row, StoreError> {
        self.check_failure()?;
        let patch = into_object(patch)?;
        let row = {
            let mut tables = lock(&self.tables);
            let current = tables
                .get_mut(&table)
                .and_then(|t| t.rows.get_mut(&id))
                .ok_or(StoreError::NotFound { table, id })?;
            current.extend(patch);
            with_id(id, current)
        };
        self.feed.publish(table, ChangeKind::Update);
        Ok(row)
    }

    async fn delete(&self, table: Table, id: i64) -> Result<(), StoreError> {
        self.check_failure()?;
        lock(&self.tables)
            .get_mut(&table)
            .and_then(|t| t.rows.remove(&id))
            .ok_or(StoreError::NotFound { table, id })?;
        self.feed.publish(table, ChangeKind::Delete);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
