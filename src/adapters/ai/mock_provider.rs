//! Mock Provider - scripted AiProvider for tests and local development.
//!
//! Queue replies and failures ahead of time; calls consume the queue in
//! order and fall back to a default reply when it runs dry. Requests are
//! recorded for assertion.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::ports::{
    AiProvider, CompletionRequest, CompletionResponse, ProviderError, ProviderInfo,
};

/// Scripted provider for tests.
pub struct MockProvider {
    name: String,
    outcomes: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    default_reply: String,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Creates a mock with an empty queue.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_reply: "mock reply".to_string(),
            delay: None,
        }
    }

    /// Sets the reply used when the queue is empty.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Adds an artificial per-call delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a successful reply.
    pub async fn queue_reply(&self, content: impl Into<String>) {
        self.outcomes.lock().await.push_back(Ok(content.into()));
    }

    /// Queues a failure.
    pub async fn queue_failure(&self, error: ProviderError) {
        self.outcomes.lock().await.push_back(Err(error));
    }

    /// Number of calls received.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Messages of the nth recorded request.
    pub async fn request(&self, index: usize) -> Option<CompletionRequest> {
        self.requests.lock().await.get(index).cloned()
    }
}

#[async_trait]
impl AiProvider for MockProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.requests.lock().await.push(request);

        let outcome = self.outcomes.lock().await.pop_front();
        match outcome {
            Some(Ok(content)) => Ok(CompletionResponse {
                content,
                model: "mock".to_string(),
            }),
            Some(Err(err)) => Err(err),
            None => Ok(CompletionResponse {
                content: self.default_reply.clone(),
                model: "mock".to_string(),
            }),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new(&self.name, "mock")
    }
}
