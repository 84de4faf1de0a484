//! Configuration management for Arogya services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - The plain `PINECONE_API_KEY` / `OPENAI_API_KEY` secrets
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the vector index secret
pub const PINECONE_API_KEY_VAR: &str = "PINECONE_API_KEY";

/// Environment variable holding the language model secret
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Vector index configuration
    #[serde(default)]
    pub pinecone: PineconeConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding `index.html`
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PineconeConfig {
    /// API key (required)
    #[serde(default)]
    pub api_key: String,

    /// Name of the pre-populated index
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Control plane base URL used to resolve the index host
    #[serde(default = "default_pinecone_controller")]
    pub controller_url: String,

    /// Data plane host; resolved from the control plane when unset
    pub host: Option<String>,

    /// Namespace inside the index
    #[serde(default)]
    pub namespace: String,

    /// Metadata key holding the chunk text
    #[serde(default = "default_text_key")]
    pub text_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: huggingface, openai
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API key for the embedding service (optional for huggingface)
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Search type: similarity, similarity_score_threshold
    #[serde(default = "default_search_type")]
    pub search_type: String,

    /// Number of chunks to retrieve
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum score, used by similarity_score_threshold
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// API key (required)
    #[serde(default)]
    pub api_key: String,

    /// API base URL
    #[serde(default = "default_llm_base")]
    pub api_base: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API mode: completions, chat
    #[serde(default = "default_llm_mode")]
    pub mode: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error); RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Prometheus exporter port (0 to disable)
    #[serde(default)]
    pub metrics_port: u16,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_template_dir() -> PathBuf { PathBuf::from("templates") }
fn default_index_name() -> String { "arogya-sahayak".to_string() }
fn default_pinecone_controller() -> String { "https://api.pinecone.io".to_string() }
fn default_text_key() -> String { "text".to_string() }
fn default_upstream_timeout() -> u64 { 30 }
fn default_embedding_provider() -> String { "huggingface".to_string() }
fn default_embedding_model() -> String { "sentence-transformers/all-MiniLM-L6-v2".to_string() }
fn default_embedding_dimension() -> usize { 384 }
fn default_search_type() -> String { "similarity".to_string() }
fn default_top_k() -> usize { 3 }
fn default_llm_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_llm_model() -> String { "gpt-3.5-turbo-instruct".to_string() }
fn default_llm_mode() -> String { "completions".to_string() }
fn default_temperature() -> f32 { 0.4 }
fn default_max_tokens() -> u32 { 500 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            template_dir: default_template_dir(),
        }
    }
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            index_name: default_index_name(),
            controller_url: default_pinecone_controller(),
            host: None,
            namespace: String::new(),
            text_key: default_text_key(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_type: default_search_type(),
            top_k: default_top_k(),
            score_threshold: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_llm_base(),
            model: default_llm_model(),
            mode: default_llm_mode(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: 0,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment and files
    pub fn load() -> Result<Self> {
        Self::load_from_env(std::env::vars().collect())
    }

    /// Load configuration from an explicit environment snapshot.
    ///
    /// Fails when either required secret is missing or blank.
    pub fn load_from_env(vars: HashMap<String, String>) -> Result<Self> {
        let env = vars
            .get("APP_ENV")
            .cloned()
            .unwrap_or_else(|| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            )

            // Plain secrets win over everything else
            .set_override_option("pinecone.api_key", vars.get(PINECONE_API_KEY_VAR).cloned())?
            .set_override_option("llm.api_key", vars.get(OPENAI_API_KEY_VAR).cloned())?

            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that both required secrets are present
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.pinecone.api_key.trim().is_empty() {
            missing.push(PINECONE_API_KEY_VAR);
        }
        if self.llm.api_key.trim().is_empty() {
            missing.push(OPENAI_API_KEY_VAR);
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Configuration {
                message: format!("Missing required API keys: {}", missing.join(", ")),
            })
        }
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl PineconeConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EmbeddingConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl LlmConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
