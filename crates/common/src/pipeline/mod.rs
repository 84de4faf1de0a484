//! Retrieval-augmented answer pipeline
//!
//! embed query -> fetch top-K context -> assemble prompt -> generate answer.
//! No retries and no caching: the first failing step aborts the call.

use crate::config::AppConfig;
use crate::embeddings::{self, Embedder};
use crate::errors::{AppError, Result};
use crate::llm::{self, GenerationConfig, Generator};
use crate::prompt::PromptAssembler;
use crate::retrieval::{RetrievedContext, Retriever, SearchKind};
use crate::vector::{PineconeIndex, VectorIndex};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A validated user question: trimmed and never blank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Trim the raw input, rejecting missing or blank messages
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            Some(text) if !text.is_empty() => Ok(Self(text.to_string())),
            _ => Err(AppError::MissingMessage),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Full pipeline output for one query
#[derive(Debug, Clone, PartialEq)]
pub struct RagResponse {
    pub input: String,
    pub context: RetrievedContext,
    pub answer: Option<String>,
}

/// Composes retriever, prompt assembler and generator
pub struct RagPipeline {
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: Arc<dyn Generator>,
    generation: GenerationConfig,
}

impl RagPipeline {
    pub fn new(
        retriever: Retriever,
        assembler: PromptAssembler,
        generator: Arc<dyn Generator>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            retriever,
            assembler,
            generator,
            generation,
        }
    }

    /// Build the pipeline from explicit client handles
    pub fn from_clients(
        config: &AppConfig,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let retriever = Retriever::new(
            embedder,
            index,
            SearchKind::from_config(&config.retrieval)?,
            config.retrieval.top_k,
            config.pinecone.text_key.clone(),
        );

        let generation = GenerationConfig {
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        };

        Ok(Self::new(retriever, PromptAssembler::default(), generator, generation))
    }

    /// Initialize every upstream client described by configuration
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        tracing::info!(provider = %config.embedding.provider, model = %config.embedding.model, "Loading embeddings...");
        let embedder = embeddings::create_embedder(&config.embedding)?;

        tracing::info!(index = %config.pinecone.index_name, "Connecting to vector index...");
        let index: Arc<dyn VectorIndex> = Arc::new(PineconeIndex::connect(&config.pinecone).await?);

        tracing::info!(model = %config.llm.model, mode = %config.llm.mode, "Initializing LLM...");
        let generator = llm::create_generator(&config.llm)?;

        Self::from_clients(config, embedder, index, generator)
    }

    /// Run the pipeline, keeping the generator's optional answer as-is
    pub async fn invoke(&self, query: &Query) -> Result<RagResponse> {
        let start = Instant::now();

        let context = self.retriever.retrieve(query.as_str()).await?;
        let prompt = self.assembler.assemble(&context, query.as_str());
        let result = self.generator.generate(&prompt, &self.generation).await?;

        tracing::debug!(
            documents = context.len(),
            model = %self.generator.model(),
            usage = ?result.usage,
            latency_ms = start.elapsed().as_millis() as u64,
            "Pipeline completed"
        );

        Ok(RagResponse {
            input: query.as_str().to_string(),
            context,
            answer: result.answer,
        })
    }

    /// Run the pipeline and return the answer text.
    ///
    /// A reply without an answer fails with `GenerationFailed`.
    pub async fn answer(&self, query: &Query) -> Result<String> {
        let response = self.invoke(query).await?;

        response.answer.ok_or_else(|| {
            tracing::error!("Generator returned no answer");
            AppError::GenerationFailed {
                message: "generator returned no answer".to_string(),
            }
        })
    }
}
