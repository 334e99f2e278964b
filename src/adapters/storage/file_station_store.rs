//! File-based Station Store Adapter
//!
//! Persists station documents as pretty-printed JSON files named by a
//! locally generated identifier. Serves as the degraded-mode system of
//! record when the primary document store is unavailable; a later sync
//! updates the record in place with the canonical id.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::{StationRecordId, Timestamp};
use crate::ports::{FallbackStore, StationStore, StoreError};

/// Sync status of a record still waiting for the primary store.
const STATUS_PENDING: &str = "pending_sync";
/// Sync status once the primary store accepted the document.
const STATUS_SYNCED: &str = "synced";

/// Local filesystem store for station documents.
#[derive(Debug, Clone)]
pub struct FileStationStore {
    base_path: PathBuf,
}

impl FileStationStore {
    /// Creates a store rooted at `base_path`.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    async fn ensure_dir(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))
    }

    async fn write_record(&self, id: &str, record: &Value) -> Result<(), StoreError> {
        let pretty = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::Other(e.to_string()))?;
        fs::write(self.record_path(id), pretty)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))
    }

    /// Loads a record by id.
    pub async fn load(&self, id: &str) -> Result<Value, StoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(StoreError::Other(format!("record {} not found", id)));
        }
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| StoreError::Other(e.to_string()))
    }

    /// Lists the ids of all persisted records.
    pub async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::Other(e.to_string()))?
        {
            let name = entry.file_name();
            if let Some(id) = name.to_string_lossy().strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Persists `document` under a fresh local id with bookkeeping fields.
    ///
    /// The bookkeeping fields are flat, so they survive any later depth
    /// sanitization untouched.
    async fn save_new(&self, document: &Value) -> Result<String, StoreError> {
        self.ensure_dir().await?;

        let id = StationRecordId::new().to_string();
        let mut record = document.clone();
        if let Some(map) = record.as_object_mut() {
            map.insert("id".to_string(), Value::String(id.clone()));
            map.insert(
                "created_at".to_string(),
                Value::String(Timestamp::now().to_rfc3339()),
            );
            map.insert(
                "sync_status".to_string(),
                Value::String(STATUS_PENDING.to_string()),
            );
        }

        self.write_record(&id, &record).await?;
        Ok(id)
    }
}

#[async_trait]
impl StationStore for FileStationStore {
    async fn add(&self, document: &Value) -> Result<String, StoreError> {
        self.save_new(document).await
    }
}

#[async_trait]
impl FallbackStore for FileStationStore {
    async fn save_fallback(&self, document: &Value) -> Result<String, StoreError> {
        self.save_new(document).await
    }

    async fn mark_synced(&self, local_id: &str, canonical_id: &str) -> Result<(), StoreError> {
        let mut record = self.load(local_id).await?;

        if let Some(map) = record.as_object_mut() {
            map.insert(
                "id".to_string(),
                Value::String(canonical_id.to_string()),
            );
            map.insert(
                "sync_status".to_string(),
                Value::String(STATUS_SYNCED.to_string()),
            );
        }

        // The file keeps its local-id name: the record is updated, never
        // replaced.
        self.write_record(local_id, &record).await
    }
}
