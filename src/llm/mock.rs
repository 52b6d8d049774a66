//! Mock completion service for tests
//!
//! Replies are popped from a queue; when the queue is empty the fixed
//! fallback reply (if any) is returned. Every request is recorded.

use super::traits::{CompletionRequest, CompletionService};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct MockState {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

/// Scripted completion service.
///
/// # Example
///
/// ```rust
/// use cypher_heal::llm::{CompletionRequest, CompletionService, MockCompletionService};
///
/// # tokio_test::block_on(async {
/// let llm = MockCompletionService::with_fixed_reply("MATCH (n) RETURN n");
/// llm.push_reply("RETURN 1").await;
///
/// let request = CompletionRequest {
///     model: "gpt-4".into(),
///     messages: Vec::new(),
///     temperature: 0.0,
///     max_tokens: 1000,
/// };
/// assert_eq!(llm.complete(&request).await.unwrap(), "RETURN 1");
/// assert_eq!(llm.complete(&request).await.unwrap(), "MATCH (n) RETURN n");
/// assert_eq!(llm.call_count().await, 2);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockCompletionService {
    state: Arc<MockState>,
}

impl MockCompletionService {
    /// A service with no replies; every call fails until replies are queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that answers every request with `reply`.
    pub fn with_fixed_reply(reply: impl Into<String>) -> Self {
        Self {
            state: Arc::new(MockState {
                fallback: Some(reply.into()),
                ..Default::default()
            }),
        }
    }

    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.state.replies.lock().await.push_back(Ok(reply.into()));
    }

    /// Queue a transport-level failure.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.state
            .replies
            .lock()
            .await
            .push_back(Err(message.into()));
    }

    /// Requests received so far, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.state.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.state.requests.lock().await.len()
    }
}

#[async_trait]
impl CompletionService for MockCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.state.requests.lock().await.push(request.clone());

        match self.state.replies.lock().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => self
                .state
                .fallback
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Mock completion service has no reply queued")),
        }
    }
}
