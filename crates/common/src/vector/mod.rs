//! Vector index client
//!
//! Queries a pre-populated Pinecone index for the chunks nearest to a
//! query embedding. The index itself is owned and populated elsewhere.

use crate::config::PineconeConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// API version pinned for both control and data plane calls
const PINECONE_API_VERSION: &str = "2024-07";

/// One scored match returned by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Trait for nearest-neighbor queries against a vector index
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` matches, best first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Logical index name, for logging
    fn name(&self) -> &str;
}

/// Pinecone data plane client bound to one existing index
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    base_url: String,
    namespace: String,
}

#[derive(Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredChunk>,
}

impl PineconeIndex {
    /// Connect to an existing index.
    ///
    /// Resolves the data plane host through the control plane unless
    /// `pinecone.host` is configured.
    pub async fn connect(config: &PineconeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::VectorIndex {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let host = match &config.host {
            Some(host) => host.clone(),
            None => Self::describe_host(&client, config).await?,
        };

        let base_url = if host.contains("://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        tracing::info!(
            index = %config.index_name,
            host = %base_url,
            "Connected to vector index"
        );

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            index_name: config.index_name.clone(),
            base_url,
            namespace: config.namespace.clone(),
        })
    }

    async fn describe_host(client: &reqwest::Client, config: &PineconeConfig) -> Result<String> {
        let url = format!(
            "{}/indexes/{}",
            config.controller_url.trim_end_matches('/'),
            config.index_name
        );

        let response = client
            .get(&url)
            .header("Api-Key", &config.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .send()
            .await
            .map_err(|e| AppError::VectorIndex {
                message: format!("Describe index request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorIndex {
                message: format!("Index {} not available ({}): {}", config.index_name, status, body),
            });
        }

        let described: DescribeIndexResponse = response.json().await.map_err(|e| {
            AppError::VectorIndex {
                message: format!("Failed to parse describe response: {}", e),
            }
        })?;

        Ok(described.host)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let url = format!("{}/query", self.base_url);

        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: &self.namespace,
        };

        let response = self.client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::VectorIndex {
                message: format!("Query request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::VectorIndex {
                message: format!("Query error {}: {}", status, body),
            });
        }

        let result: QueryResponse = response.json().await.map_err(|e| AppError::VectorIndex {
            message: format!("Failed to parse query response: {}", e),
        })?;

        Ok(result.matches)
    }

    fn name(&self) -> &str {
        &self.index_name
    }
}
