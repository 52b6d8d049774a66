//! Conversation types and prompt composition

pub mod prompt;
pub mod types;

pub use prompt::build_system_message;
pub use types::{ConversationTurn, Role, TranslationContext};
