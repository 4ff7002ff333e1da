// In-memory record store: partition key + timestamp sort, newest first.
// Stands in for the analytics table the collectors and the forwarder write to.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::RecordKind;

/// One stored record: partition id, sort timestamp, optional recognized kind,
/// and the raw collector payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: String,
    pub timestamp: u64,
    pub kind: Option<RecordKind>,
    pub raw: serde_json::Value,
}

/// Read seam for the live data source; lets tests stand in a failing store.
#[async_trait::async_trait]
pub trait RecordReader: Send + Sync {
    /// Up to `limit` most-recent records of one kind, newest first.
    async fn newest_by_kind(
        &self,
        kind: RecordKind,
        limit: usize,
    ) -> anyhow::Result<Vec<StoredRecord>>;
}

pub struct MemoryStore {
    table: String,
    partitions: RwLock<HashMap<String, Vec<StoredRecord>>>,
}

impl MemoryStore {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            partitions: RwLock::new(HashMap::new()),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Upsert one record: same (id, timestamp) replaces, otherwise inserted
    /// in descending timestamp order.
    pub async fn put(&self, record: StoredRecord) {
        let mut partitions = self.partitions.write().await;
        let bucket = partitions.entry(record.id.clone()).or_default();
        match bucket.iter().position(|r| r.timestamp == record.timestamp) {
            Some(i) => bucket[i] = record,
            None => {
                let i = bucket
                    .iter()
                    .position(|r| r.timestamp < record.timestamp)
                    .unwrap_or(bucket.len());
                bucket.insert(i, record);
            }
        }
    }

    /// Up to `limit` most-recent records for one partition key, newest first.
    pub async fn query(&self, id: &str, limit: usize) -> Vec<StoredRecord> {
        let partitions = self.partitions.read().await;
        partitions
            .get(id)
            .map(|bucket| bucket.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Up to `limit` most-recent records of one kind across all partitions,
    /// newest first. Records with an unrecognized kind are never returned.
    pub async fn query_kind(&self, kind: RecordKind, limit: usize) -> Vec<StoredRecord> {
        let partitions = self.partitions.read().await;
        let mut matches: Vec<StoredRecord> = partitions
            .values()
            .flatten()
            .filter(|r| r.kind == Some(kind))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matches.truncate(limit);
        matches
    }

    pub async fn record_count(&self) -> usize {
        let partitions = self.partitions.read().await;
        partitions.values().map(Vec::len).sum()
    }
}

#[async_trait::async_trait]
impl RecordReader for MemoryStore {
    async fn newest_by_kind(
        &self,
        kind: RecordKind,
        limit: usize,
    ) -> anyhow::Result<Vec<StoredRecord>> {
        Ok(self.query_kind(kind, limit).await)
    }
}
