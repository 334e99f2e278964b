//! Gemini Provider - Implementation of TextGenerator for Google's Gemini
//! REST API.
//!
//! Rotates across the configured API keys: quota exhaustion, timeouts and
//! network failures move on to the next key, the way the surrounding
//! application survives per-key daily limits. The model is picked from
//! the preference: fast maps to the flash tier, advanced to pro.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::AiConfig;
use crate::ports::{GenerationError, ModelPreference, TextGenerator};

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API keys, tried in order.
    api_keys: Vec<Secret<String>>,
    /// Model used for fast (correction) calls.
    pub fast_model: String,
    /// Model used for advanced (generation) calls.
    pub advanced_model: String,
    /// Base URL for the API.
    pub base_url: String,
}

impl GeminiConfig {
    /// Creates a configuration with the given API keys and default models.
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: api_keys.into_iter().map(Secret::new).collect(),
            fast_model: "gemini-1.5-flash".to_string(),
            advanced_model: "gemini-1.5-pro".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    /// Builds the configuration from the typed application config.
    pub fn from_app_config(config: &AiConfig) -> Self {
        let mut built = Self::new(config.api_keys());
        built.fast_model = config.fast_model.clone();
        built.advanced_model = config.advanced_model.clone();
        built
    }

    /// Sets the base URL (used by tests against a local server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Number of configured keys.
    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }
}

/// Gemini REST provider.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Creates a provider with the given configuration.
    pub fn new(config: GeminiConfig) -> Self {
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn model_for(&self, preference: ModelPreference) -> &str {
        match preference {
            ModelPreference::Fast => &self.config.fast_model,
            ModelPreference::Advanced => &self.config.advanced_model,
        }
    }

    fn request_url(&self, model: &str, key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, model, key
        )
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{"parts": [{"text": prompt}]}]
        })
    }

    /// One attempt against one key, bounded by `timeout`.
    async fn attempt(
        &self,
        prompt: &str,
        model: &str,
        key: &Secret<String>,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        let url = self.request_url(model, key.expose_secret());
        let send = self
            .client
            .post(&url)
            .json(&Self::request_body(prompt))
            .send();

        let response = tokio::time::timeout(timeout, send)
            .await
            .map_err(|_| GenerationError::timeout(timeout))?
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::timeout(timeout)
                } else if e.is_connect() {
                    GenerationError::network(format!("connection failed: {}", e))
                } else {
                    GenerationError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => GenerationError::quota_exceeded(body),
                401 | 403 => GenerationError::network(format!("API key rejected ({})", status)),
                500..=599 => GenerationError::network(format!("server error {}: {}", status, body)),
                _ => GenerationError::parse(format!("unexpected status {}: {}", status, body)),
            });
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::parse(format!("failed to parse response: {}", e)))?;

        parse_candidates(body)
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        preference: ModelPreference,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        let model = self.model_for(preference).to_string();
        let mut last_error = GenerationError::network("no API keys configured");

        for (index, key) in self.config.api_keys.iter().enumerate() {
            debug!(key = index + 1, %model, "attempting generation");
            match self.attempt(prompt, &model, key, timeout).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    warn!(key = index + 1, error = %err, "generation attempt failed");
                    let rotate = err.is_retryable()
                        || matches!(err, GenerationError::NoValidContent { .. });
                    last_error = err;
                    if !rotate {
                        break;
                    }
                }
            }
        }

        Err(last_error)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}

/// Extracts the text of the first usable candidate.
fn parse_candidates(body: GeminiResponse) -> Result<String, GenerationError> {
    let Some(candidate) = body.candidates.into_iter().next() else {
        return Err(GenerationError::no_valid_content("no candidates returned"));
    };

    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "UNKNOWN".to_string());
        return Err(GenerationError::no_valid_content(format!(
            "finish_reason={}",
            reason
        )));
    }

    Ok(text)
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}
