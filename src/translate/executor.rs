//! Candidate query execution

use crate::error::{Error, Result};
use crate::neo4j::{ExecutionFailure, GraphConnection, QueryParams, QueryResult};
use std::sync::Arc;

/// Result of running one candidate: rows, or a classified failure
pub type ExecutionOutcome = std::result::Result<QueryResult, ExecutionFailure>;

/// Runs candidate queries, one scoped session per call.
#[derive(Clone)]
pub struct QueryExecutor {
    connection: Arc<dyn GraphConnection>,
}

impl QueryExecutor {
    pub fn new(connection: Arc<dyn GraphConnection>) -> Self {
        Self { connection }
    }

    /// Run `query` in a fresh session and release the session before returning.
    ///
    /// The outer error is reserved for failing to open a session at all.
    pub async fn execute(&self, query: &str, params: &QueryParams) -> Result<ExecutionOutcome> {
        let mut session = self
            .connection
            .open_session()
            .await
            .map_err(Error::connectivity)?;

        let outcome = session.run(query, params).await;
        session.close().await;

        match &outcome {
            Ok(result) => tracing::debug!("Query returned {} rows", result.len()),
            Err(failure) => tracing::debug!("Query failed ({:?}): {}", failure.kind, failure),
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo4j::{FailureKind, MockGraphConnection};

    #[tokio::test]
    async fn test_session_released_on_success_and_failure() {
        let mock = MockGraphConnection::new();
        mock.push_response(Ok(QueryResult::new(
            vec!["n".into()],
            vec![vec![serde_json::json!(1)]],
        )))
        .await;
        mock.push_response(Err(ExecutionFailure::syntax(None, "Invalid input")))
            .await;
        mock.push_response(Err(ExecutionFailure::other(None, "timeout")))
            .await;
        let executor = QueryExecutor::new(Arc::new(mock.clone()));
        let params = QueryParams::new();

        let ok = executor.execute("RETURN 1 AS n", &params).await.unwrap();
        assert_eq!(ok.unwrap().rows.len(), 1);
        assert_eq!(mock.sessions_opened(), 1);
        assert_eq!(mock.sessions_closed(), 1);

        let syntax = executor.execute("RETRN 1", &params).await.unwrap();
        assert_eq!(syntax.unwrap_err().kind, FailureKind::Syntax);
        assert_eq!(mock.sessions_closed(), 2);

        let other = executor.execute("RETURN 1", &params).await.unwrap();
        assert_eq!(other.unwrap_err().kind, FailureKind::Other);
        assert_eq!(mock.sessions_opened(), 3);
        assert_eq!(mock.sessions_closed(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_database_is_connectivity_error() {
        let mock = MockGraphConnection::new();
        mock.set_unreachable(true);
        let executor = QueryExecutor::new(Arc::new(mock.clone()));

        let err = executor
            .execute("RETURN 1", &QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connectivity(_)));
        assert_eq!(mock.sessions_closed(), 0);
    }
}
