//! Completion-service boundary
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `CompletionService` trait: async interface for chat completion
//! - `HttpCompletionService`: any OpenAI-compatible chat-completions API
//! - `MockCompletionService`: scripted replies for tests

pub mod mock;
pub mod provider;
pub mod traits;

pub use mock::MockCompletionService;
pub use provider::HttpCompletionService;
pub use traits::{CompletionRequest, CompletionService};
