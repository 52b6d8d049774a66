//! In-memory mock implementation of GraphConnection for testing.
//!
//! Responses are either matched by a substring of the query text
//! (stable fixtures such as introspection queries) or popped from a
//! FIFO script. Session open/close counts are tracked so tests can check
//! that no session leaks.

use super::models::*;
use super::traits::{GraphConnection, GraphSession};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

type Response = std::result::Result<QueryResult, ExecutionFailure>;

#[derive(Default)]
struct MockState {
    fixtures: Mutex<Vec<(String, Response)>>,
    script: Mutex<VecDeque<Response>>,
    executed: Mutex<Vec<String>>,
    sessions_opened: AtomicUsize,
    sessions_closed: AtomicUsize,
    unreachable: AtomicBool,
}

/// In-memory mock of a graph database connection.
#[derive(Clone, Default)]
pub struct MockGraphConnection {
    state: Arc<MockState>,
}

impl MockGraphConnection {
    /// Create a mock that answers every query with an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any query containing `fragment` with `response`.
    ///
    /// Fixtures are checked before the script, first match wins.
    pub async fn on_query(&self, fragment: &str, response: Response) {
        self.state
            .fixtures
            .lock()
            .await
            .push((fragment.to_string(), response));
    }

    /// Queue a response for the next query that matches no fixture.
    pub async fn push_response(&self, response: Response) {
        self.state.script.lock().await.push_back(response);
    }

    /// Make `open_session` fail from now on.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.sessions_closed.load(Ordering::SeqCst)
    }

    /// Every query text run so far, in order.
    pub async fn executed_queries(&self) -> Vec<String> {
        self.state.executed.lock().await.clone()
    }
}

#[async_trait]
impl GraphConnection for MockGraphConnection {
    async fn open_session(&self) -> Result<Box<dyn GraphSession>> {
        if self.state.unreachable.load(Ordering::SeqCst) {
            anyhow::bail!("Mock database is unreachable");
        }
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockGraphSession {
            state: self.state.clone(),
        }))
    }
}

struct MockGraphSession {
    state: Arc<MockState>,
}

#[async_trait]
impl GraphSession for MockGraphSession {
    async fn run(&mut self, query: &str, _params: &QueryParams) -> Response {
        self.state.executed.lock().await.push(query.to_string());

        let fixtures = self.state.fixtures.lock().await;
        if let Some((_, response)) = fixtures.iter().find(|(f, _)| query.contains(f.as_str())) {
            return response.clone();
        }
        drop(fixtures);

        self.state
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::default()))
    }

    async fn close(self: Box<Self>) {
        self.state.sessions_closed.fetch_add(1, Ordering::SeqCst);
    }
}
