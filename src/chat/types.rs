//! Conversation types sent to the completion service

use serde::{Deserialize, Serialize};

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered turns for one question.
///
/// Exactly one system turn, always first; only user and assistant turns
/// can be appended after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TranslationContext {
    turns: Vec<ConversationTurn>,
}

impl TranslationContext {
    /// Start a context from the system turn and the user's question.
    pub fn new(system: ConversationTurn, question: &str) -> Self {
        let system = ConversationTurn {
            role: Role::System,
            content: system.content,
        };
        Self {
            turns: vec![system, ConversationTurn::user(question)],
        }
    }

    /// Record a failed candidate and ask for a corrected one.
    pub fn push_correction(&mut self, failed_query: &str, error_detail: &str) {
        self.turns.push(ConversationTurn::assistant(failed_query));
        self.turns.push(ConversationTurn::user(format!(
            "This query returns an error: {}\n\
             Give me an improved query that works without any explanations or apologies",
            error_detail
        )));
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
