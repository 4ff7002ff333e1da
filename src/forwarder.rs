// Record-ingestion forwarder: decode an inbound envelope of base64 JSON
// records and upsert each into the record store, reporting per-record
// success/failure. A bad record fails alone; the batch continues.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::models::RecordKind;
use crate::store::{MemoryStore, StoredRecord};

/// Inbound batch envelope (stream-processor event shape).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestEnvelope {
    pub records: Vec<IngestRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRecord {
    #[serde(default)]
    pub sequence_number: String,
    /// Base64-encoded JSON payload.
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRecord {
    pub record_id: String,
    pub error: String,
}

/// Per-batch processing summary returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub message: String,
    pub processed: usize,
    pub failed: usize,
    pub total_records: usize,
    pub failed_records: Vec<FailedRecord>,
}

/// Decode and upsert one batch. Pass-through only: no aggregation happens
/// here, records land in the store exactly as sent (with defaulted id,
/// timestamp, and source fields filled in).
pub async fn process(store: &MemoryStore, envelope: IngestEnvelope) -> IngestSummary {
    let total_records = envelope.records.len();
    let mut processed = 0usize;
    let mut failed_records = Vec::new();

    for record in envelope.records {
        match decode_record(&record) {
            Ok(stored) => {
                tracing::debug!(
                    operation = "ingest_record",
                    id = %stored.id,
                    timestamp = stored.timestamp,
                    "record stored"
                );
                store.put(stored).await;
                processed += 1;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    operation = "ingest_record",
                    sequence_number = %record.sequence_number,
                    "failed to process record"
                );
                failed_records.push(FailedRecord {
                    record_id: record.sequence_number.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    IngestSummary {
        message: "Processing complete".into(),
        processed,
        failed: failed_records.len(),
        total_records,
        failed_records,
    }
}

fn decode_record(record: &IngestRecord) -> anyhow::Result<StoredRecord> {
    let bytes = BASE64.decode(&record.data)?;
    let payload = String::from_utf8(bytes)?;
    let mut data: serde_json::Value = serde_json::from_str(&payload)?;

    let now = chrono::Utc::now().timestamp_millis() as u64;
    let timestamp = data
        .get("timestamp")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(now);
    let kind = data
        .get("type")
        .and_then(serde_json::Value::as_str)
        .and_then(RecordKind::parse);
    let id = data
        .get("id")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            let prefix = kind.map_or("record", |k| k.as_str());
            format!("{prefix}-{timestamp}")
        });

    // Fill the defaulted attributes back into the stored payload, the way
    // the original processor enriched items before the put.
    if let Some(obj) = data.as_object_mut() {
        obj.entry("id").or_insert_with(|| id.clone().into());
        obj.entry("timestamp").or_insert_with(|| timestamp.into());
        obj.entry("source").or_insert_with(|| "unknown".into());
    }

    Ok(StoredRecord {
        id,
        timestamp,
        kind,
        raw: data,
    })
}
