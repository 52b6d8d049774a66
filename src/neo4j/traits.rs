//! Database boundary traits
//!
//! Defines the abstract interface the translator uses to talk to a graph
//! database, enabling testing with mock implementations and future backend swaps.

use super::models::{ExecutionFailure, QueryParams, QueryResult};
use anyhow::Result;
use async_trait::async_trait;

/// A connection target that hands out scoped sessions.
///
/// Implementations must be thread-safe (`Send + Sync`) so independent
/// callers can each open their own session concurrently.
#[async_trait]
pub trait GraphConnection: Send + Sync {
    /// Open a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached.
    async fn open_session(&self) -> Result<Box<dyn GraphSession>>;
}

/// A single scoped session. Not shared between callers.
#[async_trait]
pub trait GraphSession: Send {
    /// Run a query with named parameters and collect every row.
    ///
    /// Failures are already classified; see [`ExecutionFailure`].
    async fn run(
        &mut self,
        query: &str,
        params: &QueryParams,
    ) -> std::result::Result<QueryResult, ExecutionFailure>;

    /// Release the session. Called exactly once on every exit path.
    async fn close(self: Box<Self>);
}
