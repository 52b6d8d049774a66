//! Query synthesis through the completion service

use crate::chat::TranslationContext;
use crate::error::{Error, Result};
use crate::llm::{CompletionRequest, CompletionService};
use std::sync::Arc;

/// Sampling temperature for every synthesis call
pub const TEMPERATURE: f32 = 0.0;

/// Turns a [`TranslationContext`] into a candidate query.
///
/// One completion call per invocation, never retried here.
#[derive(Clone)]
pub struct QuerySynthesizer {
    service: Arc<dyn CompletionService>,
    model: String,
    max_tokens: u32,
}

impl QuerySynthesizer {
    pub fn new(service: Arc<dyn CompletionService>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            service,
            model: model.into(),
            max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn synthesize(&self, context: &TranslationContext) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: context.turns().to_vec(),
            temperature: TEMPERATURE,
            max_tokens: self.max_tokens,
        };

        let text = self
            .service
            .complete(&request)
            .await
            .map_err(Error::synthesis)?;

        let query = clean_candidate(&text);
        if query.is_empty() {
            return Err(Error::Synthesis(
                "completion service returned empty content".into(),
            ));
        }

        tracing::debug!("Generated Cypher: {}", query);
        Ok(query)
    }
}

/// Trim the reply and strip a surrounding Markdown code fence.
fn clean_candidate(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string (e.g. "cypher") on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => strip_info_string(rest),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

/// Language tags models put on a fence that has no line break after it.
const INFO_STRINGS: &[&str] = &["cypher", "neo4j", "sql", "text"];

fn strip_info_string(rest: &str) -> &str {
    let word_end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let word = &rest[..word_end];
    if INFO_STRINGS.iter().any(|tag| tag.eq_ignore_ascii_case(word)) {
        &rest[word_end..]
    } else {
        rest
    }
}
