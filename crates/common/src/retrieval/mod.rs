//! Context retrieval
//!
//! Embeds a query and asks the vector index for the most similar chunks.

use crate::config::RetrievalConfig;
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use crate::vector::{ScoredChunk, VectorIndex};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Separator placed between documents when they are stuffed into a prompt
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// How matches are selected from the index
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchKind {
    /// Plain top-K by similarity
    Similarity,
    /// Top-K, then drop matches scoring below the threshold
    SimilarityScoreThreshold { threshold: f32 },
}

impl SearchKind {
    /// Build the search kind from configuration
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        match config.search_type.as_str() {
            "similarity" => Ok(SearchKind::Similarity),
            "similarity_score_threshold" => {
                let threshold = config.score_threshold.ok_or_else(|| AppError::Configuration {
                    message: "retrieval.score_threshold is required for similarity_score_threshold"
                        .to_string(),
                })?;
                Ok(SearchKind::SimilarityScoreThreshold { threshold })
            }
            other => Err(AppError::Configuration {
                message: format!("Unknown search type: {}", other),
            }),
        }
    }

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Similarity => "similarity",
            SearchKind::SimilarityScoreThreshold { .. } => "similarity_score_threshold",
        }
    }
}

/// A retrieved document chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub score: f32,
    pub metadata: Map<String, Value>,
}

impl Document {
    /// Split a raw index match into page text and remaining metadata.
    ///
    /// Returns `None` when the match carries no text under `text_key`.
    fn from_chunk(mut chunk: ScoredChunk, text_key: &str) -> Option<Self> {
        let content = match chunk.metadata.remove(text_key)? {
            Value::String(text) => text,
            other => other.to_string(),
        };

        Some(Self {
            id: chunk.id,
            content,
            score: chunk.score,
            metadata: chunk.metadata,
        })
    }
}

/// Ordered documents retrieved for one query, best first
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievedContext {
    documents: Vec<Document>,
}

impl RetrievedContext {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Render the documents as prompt text
    pub fn render(&self) -> String {
        self.documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }
}

/// Retriever combining an embedder with a vector index
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    search: SearchKind,
    top_k: usize,
    text_key: String,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        search: SearchKind,
        top_k: usize,
        text_key: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            index,
            search,
            top_k,
            text_key: text_key.into(),
        }
    }

    /// Fetch the context for a query
    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext> {
        let start = Instant::now();

        let embedding = self.embedder.embed(query).await?;
        let matches = self.index.query(&embedding, self.top_k).await?;

        let documents: Vec<Document> = matches
            .into_iter()
            .filter(|m| match self.search {
                SearchKind::Similarity => true,
                SearchKind::SimilarityScoreThreshold { threshold } => m.score >= threshold,
            })
            .take(self.top_k)
            .filter_map(|m| {
                let id = m.id.clone();
                let document = Document::from_chunk(m, &self.text_key);
                if document.is_none() {
                    tracing::warn!(id = %id, text_key = %self.text_key, "Skipping match without text");
                }
                document
            })
            .collect();

        let elapsed = start.elapsed();
        crate::metrics::record_retrieval(elapsed.as_secs_f64(), self.search.as_str(), documents.len());

        tracing::debug!(
            index = %self.index.name(),
            mode = self.search.as_str(),
            results = documents.len(),
            latency_ms = elapsed.as_millis() as u64,
            "Retrieved context"
        );

        Ok(RetrievedContext::new(documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;
    use async_trait::async_trait;

    struct FixedIndex {
        matches: Vec<ScoredChunk>,
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
            Ok(self.matches.iter().take(top_k).cloned().collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn chunk(id: &str, text: &str, score: f32) -> ScoredChunk {
        let mut metadata = Map::new();
        metadata.insert("text".to_string(), Value::String(text.to_string()));
        metadata.insert("source".to_string(), Value::String("Medical_book.pdf".to_string()));
        ScoredChunk {
            id: id.to_string(),
            score,
            metadata,
        }
    }

    fn retriever(search: SearchKind) -> Retriever {
        let index = FixedIndex {
            matches: vec![
                chunk("a", "Acne is a skin condition.", 0.91),
                chunk("b", "Treatment includes topical retinoids.", 0.74),
                chunk("c", "See a dermatologist if scarring occurs.", 0.42),
                chunk("d", "Unrelated text.", 0.10),
            ],
        };
        Retriever::new(
            Arc::new(MockEmbedder::new(16)),
            Arc::new(index),
            search,
            3,
            "text",
        )
    }

    #[tokio::test]
    async fn test_similarity_returns_top_k() {
        let context = retriever(SearchKind::Similarity).retrieve("acne").await.unwrap();

        assert_eq!(context.len(), 3);
        assert_eq!(context.documents()[0].id, "a");
        assert_eq!(context.documents()[0].content, "Acne is a skin condition.");
        assert_eq!(
            context.documents()[0].metadata.get("source"),
            Some(&Value::String("Medical_book.pdf".to_string()))
        );
        assert!(!context.documents()[0].metadata.contains_key("text"));
    }

    #[tokio::test]
    async fn test_score_threshold_filters() {
        let search = SearchKind::SimilarityScoreThreshold { threshold: 0.5 };
        let context = retriever(search).retrieve("acne").await.unwrap();

        assert_eq!(context.len(), 2);
        assert!(context.documents().iter().all(|d| d.score >= 0.5));
    }

    #[tokio::test]
    async fn test_matches_without_text_are_skipped() {
        let mut untitled = chunk("b", "ignored", 0.8);
        untitled.metadata.remove("text");

        let index = FixedIndex {
            matches: vec![chunk("a", "first", 0.9), untitled, chunk("c", "third", 0.7)],
        };
        let retriever = Retriever::new(
            Arc::new(MockEmbedder::new(16)),
            Arc::new(index),
            SearchKind::Similarity,
            3,
            "text",
        );

        let context = retriever.retrieve("acne").await.unwrap();
        let ids: Vec<&str> = context.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(context.render(), "first\n\nthird");
    }

    #[test]
    fn test_render_joins_with_blank_line() {
        let context = RetrievedContext::new(vec![
            Document::from_chunk(chunk("a", "first", 0.9), "text").unwrap(),
            Document::from_chunk(chunk("b", "second", 0.8), "text").unwrap(),
        ]);
        assert_eq!(context.render(), "first\n\nsecond");
        assert_eq!(RetrievedContext::default().render(), "");
    }

    #[test]
    fn test_search_kind_from_config() {
        let config = RetrievalConfig::default();
        assert_eq!(SearchKind::from_config(&config).unwrap(), SearchKind::Similarity);

        let config = RetrievalConfig {
            search_type: "similarity_score_threshold".to_string(),
            score_threshold: None,
            ..RetrievalConfig::default()
        };
        assert!(SearchKind::from_config(&config).is_err());

        let config = RetrievalConfig {
            search_type: "mmr".to_string(),
            ..RetrievalConfig::default()
        };
        assert!(SearchKind::from_config(&config).is_err());
    }
}
