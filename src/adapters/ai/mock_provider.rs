//! Mock text generator for testing.
//!
//! Configurable queue of responses and failures, simulated latency, and
//! call tracking, so pipeline tests run without touching a real provider.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{GenerationError, ModelPreference, TextGenerator};

/// One recorded call to the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub preference: ModelPreference,
    pub timeout: Duration,
}

/// Configured failure kinds, cloneable unlike [`GenerationError`].
#[derive(Debug, Clone)]
pub enum MockGenerationFailure {
    QuotaExceeded { message: String },
    Timeout { timeout_secs: u64 },
    NoValidContent,
    Network { message: String },
}

impl From<MockGenerationFailure> for GenerationError {
    fn from(failure: MockGenerationFailure) -> Self {
        match failure {
            MockGenerationFailure::QuotaExceeded { message } => {
                GenerationError::quota_exceeded(message)
            }
            MockGenerationFailure::Timeout { timeout_secs } => {
                GenerationError::timeout(Duration::from_secs(timeout_secs))
            }
            MockGenerationFailure::NoValidContent => {
                GenerationError::no_valid_content("mock: empty candidates")
            }
            MockGenerationFailure::Network { message } => GenerationError::network(message),
        }
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Success(String),
    Failure(MockGenerationFailure),
}

/// Mock implementation of the text generation port.
///
/// Clones share the response queue and call history, so a test can hold
/// one handle for assertions while the pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct MockTextGenerator {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    delay: Duration,
}

impl MockTextGenerator {
    /// Creates a mock with an empty response queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Success(content.into()));
        self
    }

    /// Queues a failure.
    pub fn with_failure(self, failure: MockGenerationFailure) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Failure(failure));
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Prompt of the most recent call, if any.
    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|c| c.prompt.clone())
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success("Mock response".to_string()))
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        preference: ModelPreference,
        timeout: Duration,
    ) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            preference,
            timeout,
        });

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success(content) => Ok(content),
            MockResponse::Failure(failure) => Err(failure.into()),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
