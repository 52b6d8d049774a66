//! Error taxonomy for query translation
//!
//! Collaborator-specific failures (neo4rs, reqwest) are mapped into these
//! variants at module boundaries so the healing loop never sees them directly.

use crate::neo4j::ExecutionFailure;
use thiserror::Error;

/// Errors surfaced to the caller of [`TranslationSession::answer`](crate::TranslationSession::answer).
#[derive(Debug, Error)]
pub enum Error {
    /// The database could not be reached, or an introspection query failed.
    #[error("database connectivity error: {0}")]
    Connectivity(String),

    /// The database exposes no usable metadata facility.
    #[error("schema unavailable: {0}")]
    SchemaUnavailable(String),

    /// The completion service was unreachable or returned nothing usable.
    #[error("query synthesis failed: {0}")]
    Synthesis(String),

    /// A candidate query failed in a way healing does not cover.
    #[error("query execution failed: {0}")]
    Execution(ExecutionFailure),
}

impl Error {
    /// Wrap an `anyhow` chain as a connectivity error, keeping every cause.
    pub(crate) fn connectivity(err: anyhow::Error) -> Self {
        Self::Connectivity(format!("{:#}", err))
    }

    /// Wrap an `anyhow` chain as a synthesis error, keeping every cause.
    pub(crate) fn synthesis(err: anyhow::Error) -> Self {
        Self::Synthesis(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_connectivity_keeps_cause_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
        let err = err.context("Failed to connect to Neo4j").unwrap_err();

        let wrapped = Error::connectivity(err);
        let text = wrapped.to_string();
        assert!(text.contains("Failed to connect to Neo4j"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_execution_display_includes_failure() {
        let failure = ExecutionFailure::other(None, "Query timed out");
        let err = Error::Execution(failure);
        assert!(err.to_string().contains("Query timed out"));
    }
}
