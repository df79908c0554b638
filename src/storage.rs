use crate::error::StoreError;
use crate::types::LoanRecord;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

/// A remote table that accepts insert-or-replace writes keyed by a conflict
/// column.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Upsert `records` into `table` in a single request. Rows whose
    /// `on_conflict` value already exists are replaced.
    async fn upsert(
        &self,
        table: &str,
        records: &[LoanRecord],
        on_conflict: &str,
    ) -> Result<(), StoreError>;
}

/// In-memory table used by tests. Each request is applied all-or-nothing, the
/// way a database transaction would be.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, HashMap<String, LoanRecord>>>,
    rejected_keys: HashSet<String>,
    request_sizes: Mutex<Vec<usize>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses any request containing one of `keys`, as if those
    /// rows violated a constraint.
    pub fn rejecting<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rejected_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub async fn len(&self, table: &str) -> usize {
        self.tables.lock().await.get(table).map_or(0, HashMap::len)
    }

    pub async fn get(&self, table: &str, key: &str) -> Option<LoanRecord> {
        self.tables
            .lock()
            .await
            .get(table)
            .and_then(|rows| rows.get(key))
            .cloned()
    }

    /// Number of records carried by each request received, in arrival order.
    pub async fn request_sizes(&self) -> Vec<usize> {
        self.request_sizes.lock().await.clone()
    }
}

fn conflict_key(record: &LoanRecord, on_conflict: &str) -> Result<String, StoreError> {
    let value = serde_json::to_value(record)?;
    match value.get(on_conflict) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(serde_json::Value::Null) | None => Err(StoreError::Rejected {
            status: 400,
            body: format!("null value in column \"{on_conflict}\" violates not-null constraint"),
        }),
        Some(other) => Ok(other.to_string()),
    }
}

#[async_trait]
impl LoanStore for InMemoryStore {
    async fn upsert(
        &self,
        table: &str,
        records: &[LoanRecord],
        on_conflict: &str,
    ) -> Result<(), StoreError> {
        self.request_sizes.lock().await.push(records.len());

        let mut staged = Vec::with_capacity(records.len());
        for record in records {
            let key = conflict_key(record, on_conflict)?;
            if self.rejected_keys.contains(&key) {
                return Err(StoreError::Rejected {
                    status: 409,
                    body: format!("row {key} rejected by constraint"),
                });
            }
            staged.push((key, record.clone()));
        }

        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table.to_string()).or_default();
        for (key, record) in staged {
            rows.insert(key, record);
        }
        debug!("Upserted {} rows into in-memory {}", records.len(), table);
        Ok(())
    }
}
