//! Text Generator Port - Interface for LLM provider integrations.
//!
//! The repair pipeline's only use of this port is the last-resort JSON
//! correction call; the surrounding application also uses it for station
//! generation. Implementations connect to an external LLM service and
//! translate its API into this contract.

use async_trait::async_trait;
use std::time::Duration;

/// Which model tier a request should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelPreference {
    /// Low-latency model, used for corrections.
    Fast,
    /// Full-capability model, used for generation.
    Advanced,
}

/// Port for LLM text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for `prompt` with a bounded timeout.
    ///
    /// Implementations must enforce `timeout` themselves and surface it
    /// as [`GenerationError::Timeout`]; callers never wait indefinitely.
    async fn generate(
        &self,
        prompt: &str,
        preference: ModelPreference,
        timeout: Duration,
    ) -> Result<String, GenerationError>;

    /// Provider and model information for logging.
    fn provider_name(&self) -> &str;
}

/// Text generation errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Provider quota exhausted for the active key.
    #[error("quota exceeded: {message}")]
    QuotaExceeded {
        /// Provider detail.
        message: String,
    },

    /// Request exceeded the configured timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },

    /// The provider answered but produced no usable text.
    #[error("no valid content in response: {reason}")]
    NoValidContent {
        /// Why the response was unusable.
        reason: String,
    },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl GenerationError {
    /// Creates a quota exceeded error.
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout {
            timeout_secs: timeout.as_secs(),
        }
    }

    /// Creates a no-valid-content error.
    pub fn no_valid_content(reason: impl Into<String>) -> Self {
        Self::NoValidContent {
            reason: reason.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if retrying on another key or later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::QuotaExceeded { .. }
                | GenerationError::Timeout { .. }
                | GenerationError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(GenerationError::quota_exceeded("daily limit").is_retryable());
        assert!(GenerationError::timeout(Duration::from_secs(30)).is_retryable());
        assert!(GenerationError::network("reset").is_retryable());

        assert!(!GenerationError::no_valid_content("empty candidates").is_retryable());
        assert!(!GenerationError::parse("bad body").is_retryable());
    }

    #[test]
    fn errors_display_with_detail() {
        let err = GenerationError::timeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "request timed out after 120s");

        let err = GenerationError::no_valid_content("finish_reason=SAFETY");
        assert!(err.to_string().contains("finish_reason=SAFETY"));
    }
}
