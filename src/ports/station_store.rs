//! Station Store Port - Interface for the document database.
//!
//! The store accepts one finished station document per pipeline run and
//! assigns the canonical identifier. The depth ceiling enforced by the
//! pipeline exists because implementations reject writes whose fields
//! nest past a fixed limit.

use async_trait::async_trait;
use serde_json::Value;

/// Port for persisting station documents.
#[async_trait]
pub trait StationStore: Send + Sync {
    /// Persists `document` and returns the canonical store id.
    async fn add(&self, document: &Value) -> Result<String, StoreError>;
}

/// Port for the degraded-mode local record store.
///
/// Records live under a locally generated identifier until a later sync
/// against the primary store succeeds; the record is then updated in
/// place with the canonical id, never replaced.
#[async_trait]
pub trait FallbackStore: Send + Sync {
    /// Persists `document` locally and returns the generated record id.
    async fn save_fallback(&self, document: &Value) -> Result<String, StoreError>;

    /// Marks the record identified by `local_id` as synced under
    /// `canonical_id`.
    async fn mark_synced(&self, local_id: &str, canonical_id: &str) -> Result<(), StoreError>;
}

/// Document store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store rejected the document's nesting depth.
    #[error("nested entity rejected: {detail}")]
    InvalidNesting {
        /// Store-side detail.
        detail: String,
    },

    /// The store is unreachable or refused the connection.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Authentication with the store failed.
    #[error("store authentication failed")]
    AuthenticationFailed,

    /// Any other store-side failure.
    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Creates an invalid nesting error.
    pub fn invalid_nesting(detail: impl Into<String>) -> Self {
        Self::InvalidNesting {
            detail: detail.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_with_detail() {
        let err = StoreError::invalid_nesting("level 3 under conteudo");
        assert!(err.to_string().contains("level 3"));

        let err = StoreError::unavailable("connection refused");
        assert!(err.to_string().contains("connection refused"));
    }
}
