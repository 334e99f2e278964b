//! Gemini provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Gemini API keys (comma-separated, rotated on quota exhaustion)
    pub gemini_api_keys: Option<String>,

    /// Model used for fast corrections
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Model used for full generation
    #[serde(default = "default_advanced_model")]
    pub advanced_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on retryable failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the configured API keys as a vector
    pub fn api_keys(&self) -> Vec<String> {
        self.gemini_api_keys
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if at least one API key is configured
    pub fn has_api_key(&self) -> bool {
        !self.api_keys().is_empty()
    }

    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::NoApiKeyConfigured);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_keys: None,
            fast_model: default_fast_model(),
            advanced_model: default_advanced_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_fast_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_advanced_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    3
}
