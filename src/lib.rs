//! Cypher Heal
//!
//! Natural-language questions to Cypher, grounded in the live schema:
//! - Schema extraction from Neo4j metadata (`apoc.meta.data()`)
//! - Prompt composition from the rendered schema
//! - Query synthesis through any OpenAI-compatible chat-completions API
//! - Execution with one self-healing retry on syntax errors

pub mod chat;
pub mod error;
pub mod llm;
pub mod neo4j;
pub mod schema;
pub mod translate;

pub use error::{Error, Result};
pub use neo4j::{QueryParams, QueryResult};
pub use translate::{Answer, HealingExhausted, SessionOptions, TranslationSession};

use serde::Deserialize;
use std::path::Path;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub neo4j: Neo4jYamlConfig,
    pub llm: LlmYamlConfig,
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Target database; server default when absent
    pub database: Option<String>,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "neo4j".into(),
            database: None,
        }
    }
}

/// Completion service configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmYamlConfig {
    /// Full chat-completions endpoint URL
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmYamlConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4".into(),
            api_key: None,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Session configuration, built once at startup and passed in explicitly
#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: Option<String>,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_max_tokens: u32,
    pub llm_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_yaml(YamlConfig::default())
    }
}

impl Config {
    /// Load configuration from environment variables only (no YAML file).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> anyhow::Result<Self> {
        let yaml = Self::load_yaml(yaml_path);
        let defaults = Self::from_yaml(yaml);

        Ok(Self {
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(defaults.neo4j_uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(defaults.neo4j_user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(defaults.neo4j_password),
            neo4j_database: std::env::var("NEO4J_DATABASE")
                .ok()
                .filter(|s| !s.is_empty())
                .or(defaults.neo4j_database),
            llm_url: std::env::var("LLM_URL").unwrap_or(defaults.llm_url),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_api_key: std::env::var("LLM_API_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .or(defaults.llm_api_key),
            llm_max_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.llm_max_tokens),
            llm_timeout_secs: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.llm_timeout_secs),
        })
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        Self {
            neo4j_uri: yaml.neo4j.uri,
            neo4j_user: yaml.neo4j.user,
            neo4j_password: yaml.neo4j.password,
            neo4j_database: yaml.neo4j.database,
            llm_url: yaml.llm.url,
            llm_model: yaml.llm.model,
            llm_api_key: yaml.llm.api_key,
            llm_max_tokens: yaml.llm.max_tokens,
            llm_timeout_secs: yaml.llm.timeout_secs,
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
