//! Caller-facing translation session

use super::executor::QueryExecutor;
use super::healing::{Answer, HealingController};
use super::synthesizer::QuerySynthesizer;
use crate::chat::{build_system_message, TranslationContext};
use crate::error::{Error, Result};
use crate::llm::{CompletionService, HttpCompletionService};
use crate::neo4j::{GraphConnection, Neo4jConnection, QueryParams};
use crate::schema::{self, SchemaDescriptor, SchemaHandle};
use crate::Config;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// Model settings for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4".into(),
            max_tokens: 1000,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            model: config.llm_model.clone(),
            max_tokens: config.llm_max_tokens,
        }
    }
}

/// Translates questions into Cypher against one database.
///
/// Owns its schema; each question gets its own context and healing state.
pub struct TranslationSession {
    connection: Arc<dyn GraphConnection>,
    schema: SchemaHandle,
    synthesizer: QuerySynthesizer,
    executor: QueryExecutor,
}

impl TranslationSession {
    /// Build a session from explicit collaborators, extracting the schema up front.
    pub async fn new(
        connection: Arc<dyn GraphConnection>,
        completion: Arc<dyn CompletionService>,
        options: SessionOptions,
    ) -> Result<Self> {
        let descriptor = schema::extract(connection.as_ref()).await?;

        Ok(Self {
            executor: QueryExecutor::new(connection.clone()),
            synthesizer: QuerySynthesizer::new(completion, options.model, options.max_tokens),
            schema: SchemaHandle::new(descriptor),
            connection,
        })
    }

    /// Connect to Neo4j and the completion API described by `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let connection = Neo4jConnection::new(
            &config.neo4j_uri,
            &config.neo4j_user,
            &config.neo4j_password,
            config.neo4j_database.as_deref(),
        )
        .await
        .map_err(Error::connectivity)?;

        let completion = HttpCompletionService::new(
            config.llm_url.clone(),
            config.llm_api_key.clone(),
            Duration::from_secs(config.llm_timeout_secs),
        )
        .map_err(Error::synthesis)?;

        Self::new(
            Arc::new(connection),
            Arc::new(completion),
            SessionOptions::from(config),
        )
        .await
    }

    /// Re-run extraction and swap in the new schema.
    ///
    /// On failure the previous schema stays in place.
    pub async fn refresh_schema(&self) -> Result<()> {
        let descriptor = schema::extract(self.connection.as_ref()).await?;
        self.schema.replace(descriptor).await;
        Ok(())
    }

    pub async fn schema(&self) -> Arc<SchemaDescriptor> {
        self.schema.snapshot().await
    }

    /// The grounding block currently sent to the model
    pub async fn schema_text(&self) -> String {
        self.schema.rendered().await
    }

    /// Translate `question`, run it, and heal once on a syntax error.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        self.answer_with_params(question, &QueryParams::new()).await
    }

    /// Like [`answer`](Self::answer), passing named parameters to every candidate.
    pub async fn answer_with_params(&self, question: &str, params: &QueryParams) -> Result<Answer> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("answer", %request_id);

        async {
            tracing::info!("Translating question: {}", question.trim());
            let system = build_system_message(&self.schema.rendered().await);
            let context = TranslationContext::new(system, question.trim());

            HealingController::new(&self.synthesizer, &self.executor)
                .run(context, params)
                .await
        }
        .instrument(span)
        .await
    }
}
