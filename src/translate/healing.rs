//! Self-healing synthesize/execute loop
//!
//! ```text
//! Synthesizing(retry) -> Executing(retry) -> Success
//!                                         -> Healing -> Synthesizing(retry + 1)
//!                                         -> Failed
//! ```
//!
//! Only syntax failures trigger healing, and at most [`MAX_RETRIES`] times.

use super::executor::QueryExecutor;
use super::synthesizer::QuerySynthesizer;
use crate::chat::TranslationContext;
use crate::error::{Error, Result};
use crate::neo4j::{ExecutionFailure, FailureKind, QueryParams, QueryResult};
use serde::Serialize;
use std::fmt;

/// Corrected re-syntheses allowed per question
pub const MAX_RETRIES: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    SyntaxError,
    OtherError,
}

/// One candidate query and what happened when it ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealingAttempt {
    pub candidate_query: String,
    pub outcome: AttemptOutcome,
    pub error_detail: Option<String>,
}

impl HealingAttempt {
    fn succeeded(candidate_query: &str) -> Self {
        Self {
            candidate_query: candidate_query.to_string(),
            outcome: AttemptOutcome::Success,
            error_detail: None,
        }
    }

    fn failed(candidate_query: &str, failure: &ExecutionFailure) -> Self {
        let outcome = match failure.kind {
            FailureKind::Syntax => AttemptOutcome::SyntaxError,
            FailureKind::Other => AttemptOutcome::OtherError,
        };
        Self {
            candidate_query: candidate_query.to_string(),
            outcome,
            error_detail: Some(failure.to_string()),
        }
    }
}

/// Terminal result when the corrected query failed as well.
///
/// Keeps every attempt so both the original and the corrected error are
/// available for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealingExhausted {
    pub attempts: Vec<HealingAttempt>,
}

impl HealingExhausted {
    pub fn first_error(&self) -> Option<&str> {
        self.attempts.first().and_then(|a| a.error_detail.as_deref())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.attempts.last().and_then(|a| a.error_detail.as_deref())
    }
}

impl fmt::Display for HealingExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid Cypher syntax after {} attempts",
            self.attempts.len()
        )?;
        for (i, attempt) in self.attempts.iter().enumerate() {
            write!(
                f,
                "\n  attempt {}: {}",
                i + 1,
                attempt.error_detail.as_deref().unwrap_or("ok")
            )?;
        }
        Ok(())
    }
}

/// What [`TranslationSession::answer`](crate::TranslationSession::answer) hands back
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// A candidate ran; `query` is the text that produced `result`
    Success { query: String, result: QueryResult },
    /// Healing was attempted and did not produce a working query
    HealingExhausted(HealingExhausted),
}

impl Answer {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The rows, if a query succeeded
    pub fn result(&self) -> Option<&QueryResult> {
        match self {
            Self::Success { result, .. } => Some(result),
            Self::HealingExhausted(_) => None,
        }
    }
}

enum State {
    Synthesizing { retry: usize },
    Executing { retry: usize, candidate: String },
    Healing {
        retry: usize,
        candidate: String,
        failure: ExecutionFailure,
    },
}

/// Drives one question through the healing state machine.
pub struct HealingController<'a> {
    synthesizer: &'a QuerySynthesizer,
    executor: &'a QueryExecutor,
}

impl<'a> HealingController<'a> {
    pub fn new(synthesizer: &'a QuerySynthesizer, executor: &'a QueryExecutor) -> Self {
        Self {
            synthesizer,
            executor,
        }
    }

    /// Run the loop until a terminal state.
    ///
    /// An `Other` failure on the first attempt is returned unchanged as
    /// [`Error::Execution`]; any failure after healing becomes
    /// [`Answer::HealingExhausted`].
    pub async fn run(
        &self,
        mut context: TranslationContext,
        params: &QueryParams,
    ) -> Result<Answer> {
        let mut attempts: Vec<HealingAttempt> = Vec::with_capacity(MAX_RETRIES + 1);
        let mut state = State::Synthesizing { retry: 0 };

        loop {
            state = match state {
                State::Synthesizing { retry } => {
                    let candidate = self.synthesizer.synthesize(&context).await?;
                    State::Executing { retry, candidate }
                }
                State::Executing { retry, candidate } => {
                    match self.executor.execute(&candidate, params).await? {
                        Ok(result) => {
                            attempts.push(HealingAttempt::succeeded(&candidate));
                            tracing::info!(
                                "Query succeeded after {} attempt(s), {} rows",
                                attempts.len(),
                                result.len()
                            );
                            return Ok(Answer::Success {
                                query: candidate,
                                result,
                            });
                        }
                        Err(failure) => {
                            attempts.push(HealingAttempt::failed(&candidate, &failure));
                            if failure.is_syntax() && retry < MAX_RETRIES {
                                State::Healing {
                                    retry,
                                    candidate,
                                    failure,
                                }
                            } else if retry == 0 && !failure.is_syntax() {
                                tracing::warn!("Query failed, not eligible for healing: {}", failure);
                                return Err(Error::Execution(failure));
                            } else {
                                tracing::warn!("Healing exhausted: {}", failure);
                                return Ok(Answer::HealingExhausted(HealingExhausted { attempts }));
                            }
                        }
                    }
                }
                State::Healing {
                    retry,
                    candidate,
                    failure,
                } => {
                    tracing::warn!("Retrying with syntax error feedback: {}", failure);
                    context.push_correction(&candidate, &failure.to_string());
                    State::Synthesizing { retry: retry + 1 }
                }
            };
        }
    }
}
