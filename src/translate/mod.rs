//! Natural-language to Cypher translation with self-healing execution

pub mod executor;
pub mod healing;
pub mod session;
pub mod synthesizer;

pub use executor::{ExecutionOutcome, QueryExecutor};
pub use healing::{Answer, AttemptOutcome, HealingAttempt, HealingController, HealingExhausted};
pub use session::{SessionOptions, TranslationSession};
pub use synthesizer::QuerySynthesizer;
