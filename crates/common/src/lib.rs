//! Arogya Common Library
//!
//! Shared code for the Arogya question-answering service including:
//! - Configuration management
//! - Error types and handling
//! - Embedding, vector index and language model clients
//! - Prompt assembly and the retrieval-augmented pipeline
//! - Metrics and observability

pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod vector;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::embeddings::Embedder;
pub use crate::errors::{AppError, Result};
pub use crate::llm::{GenerationConfig, GenerationResult, Generator};
pub use crate::pipeline::{Query, RagPipeline, RagResponse};
pub use crate::vector::{ScoredChunk, VectorIndex};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
