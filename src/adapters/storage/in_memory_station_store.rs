//! In-Memory Station Store Adapter
//!
//! HashMap-backed store with failure injection, used by tests. Can mimic
//! the document database's nesting-depth rejection so integration tests
//! exercise the fallback path the way production does.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::validation::depth;
use crate::ports::{StationStore, StoreError};

/// In-memory store for station documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStationStore {
    documents: Arc<RwLock<HashMap<String, Value>>>,
    unavailable: Arc<AtomicBool>,
    depth_ceiling: Option<usize>,
}

impl InMemoryStationStore {
    /// Creates an empty store that accepts every write.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects documents nesting deeper than `ceiling`, the way the real
    /// document database does.
    pub fn with_depth_ceiling(mut self, ceiling: usize) -> Self {
        self.depth_ceiling = Some(ceiling);
        self
    }

    /// Toggles simulated unavailability.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored documents.
    pub async fn count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Fetches a stored document by id.
    pub async fn get(&self, id: &str) -> Option<Value> {
        self.documents.read().await.get(id).cloned()
    }

    /// Clears all stored documents.
    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }
}

#[async_trait]
impl StationStore for InMemoryStationStore {
    async fn add(&self, document: &Value) -> Result<String, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("simulated outage"));
        }

        if let Some(ceiling) = self.depth_ceiling {
            let observed = depth::max_depth(document);
            if observed > ceiling {
                return Err(StoreError::invalid_nesting(format!(
                    "depth {} exceeds ceiling {}",
                    observed, ceiling
                )));
            }
        }

        let id = Uuid::new_v4().to_string();
        self.documents
            .write()
            .await
            .insert(id.clone(), document.clone());
        Ok(id)
    }
}
