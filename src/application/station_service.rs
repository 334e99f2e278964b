//! StationService - persistence orchestration for finished documents.
//!
//! One attempt against the primary store, then the local fallback. The
//! service never retries the primary on its own; a later explicit sync
//! promotes the local record to the canonical id.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::ports::{FallbackStore, StationStore, StoreError};

/// Where a document ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// The document database accepted the write.
    Primary,
    /// The document was persisted to the local filesystem record.
    LocalFallback,
}

impl StorageBackend {
    /// Wire label used in API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Primary => "primary",
            StorageBackend::LocalFallback => "local_fallback",
        }
    }
}

/// Outcome of persisting one station document.
#[derive(Debug, Clone)]
pub struct StoredStation {
    /// Canonical store id, or the locally generated record id in
    /// degraded mode.
    pub station_id: String,
    pub backend: StorageBackend,
}

/// Persists processed station documents with fallback behavior.
pub struct StationService {
    primary: Option<Arc<dyn StationStore>>,
    fallback: Arc<dyn FallbackStore>,
}

impl StationService {
    /// Creates a service. `primary` is optional: without a configured
    /// document store every write lands on the fallback.
    pub fn new(primary: Option<Arc<dyn StationStore>>, fallback: Arc<dyn FallbackStore>) -> Self {
        Self { primary, fallback }
    }

    /// Stores `document`, falling back to the local record store when the
    /// primary write fails or no primary is configured.
    pub async fn store_station(&self, document: &Value) -> Result<StoredStation, StoreError> {
        if let Some(primary) = &self.primary {
            match primary.add(document).await {
                Ok(station_id) => {
                    info!(%station_id, "station stored in the primary store");
                    return Ok(StoredStation {
                        station_id,
                        backend: StorageBackend::Primary,
                    });
                }
                Err(err) => {
                    warn!(error = %err, "primary store rejected the write, using local fallback");
                }
            }
        }

        let station_id = self.fallback.save_fallback(document).await?;
        info!(%station_id, "station stored in the local fallback");
        Ok(StoredStation {
            station_id,
            backend: StorageBackend::LocalFallback,
        })
    }

    /// Retries a locally persisted record against the primary store and,
    /// on success, updates the local record with the canonical id.
    pub async fn sync_to_primary(
        &self,
        local_id: &str,
        document: &Value,
    ) -> Result<String, StoreError> {
        let Some(primary) = &self.primary else {
            return Err(StoreError::unavailable("no primary store configured"));
        };

        let canonical_id = primary.add(document).await?;
        self.fallback.mark_synced(local_id, &canonical_id).await?;
        info!(%local_id, %canonical_id, "local record synced to the primary store");
        Ok(canonical_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FailingStore;

    #[async_trait]
    impl StationStore for FailingStore {
        async fn add(&self, _document: &Value) -> Result<String, StoreError> {
            Err(StoreError::invalid_nesting("level 3 under conteudo"))
        }
    }

    struct AcceptingStore;

    #[async_trait]
    impl StationStore for AcceptingStore {
        async fn add(&self, _document: &Value) -> Result<String, StoreError> {
            Ok("canonical-1".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingFallback {
        saved: Mutex<Vec<Value>>,
        synced: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl FallbackStore for RecordingFallback {
        async fn save_fallback(&self, document: &Value) -> Result<String, StoreError> {
            self.saved.lock().unwrap().push(document.clone());
            Ok("local-1".to_string())
        }

        async fn mark_synced(&self, local_id: &str, canonical_id: &str) -> Result<(), StoreError> {
            self.synced
                .lock()
                .unwrap()
                .push((local_id.to_string(), canonical_id.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn primary_success_skips_the_fallback() {
        let fallback = Arc::new(RecordingFallback::default());
        let service = StationService::new(Some(Arc::new(AcceptingStore)), fallback.clone());

        let stored = service.store_station(&json!({"a": 1})).await.unwrap();

        assert_eq!(stored.station_id, "canonical-1");
        assert_eq!(stored.backend, StorageBackend::Primary);
        assert!(fallback.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn primary_failure_falls_back_locally() {
        let fallback = Arc::new(RecordingFallback::default());
        let service = StationService::new(Some(Arc::new(FailingStore)), fallback.clone());

        let stored = service.store_station(&json!({"a": 1})).await.unwrap();

        assert_eq!(stored.station_id, "local-1");
        assert_eq!(stored.backend, StorageBackend::LocalFallback);
        assert_eq!(fallback.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_primary_goes_straight_to_fallback() {
        let fallback = Arc::new(RecordingFallback::default());
        let service = StationService::new(None, fallback.clone());

        let stored = service.store_station(&json!({"a": 1})).await.unwrap();

        assert_eq!(stored.backend, StorageBackend::LocalFallback);
    }

    #[tokio::test]
    async fn sync_updates_the_local_record() {
        let fallback = Arc::new(RecordingFallback::default());
        let service = StationService::new(Some(Arc::new(AcceptingStore)), fallback.clone());

        let canonical = service
            .sync_to_primary("local-1", &json!({"a": 1}))
            .await
            .unwrap();

        assert_eq!(canonical, "canonical-1");
        assert_eq!(
            fallback.synced.lock().unwrap()[0],
            ("local-1".to_string(), "canonical-1".to_string())
        );
    }

    #[tokio::test]
    async fn sync_without_primary_is_an_error() {
        let fallback = Arc::new(RecordingFallback::default());
        let service = StationService::new(None, fallback);

        let result = service.sync_to_primary("local-1", &json!({})).await;

        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn backend_labels_are_stable() {
        assert_eq!(StorageBackend::Primary.as_str(), "primary");
        assert_eq!(StorageBackend::LocalFallback.as_str(), "local_fallback");
    }
}
