//! Answer generation against a hosted language model
//!
//! Supports the OpenAI completions API (default, `gpt-3.5-turbo-instruct`)
//! and the chat completions API. The generator's reply is surfaced as a
//! typed [`GenerationResult`] whose answer may be absent.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use crate::prompt::{Message, Prompt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Sampling parameters sent with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.4,
            max_tokens: 500,
        }
    }
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
}

/// Structured result of one generation call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    /// Generated text, absent when the provider returned none
    pub answer: Option<String>,
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl GenerationResult {
    pub fn with_answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Self::default()
        }
    }
}

/// Trait for answer generation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a reply to the prompt
    async fn generate(&self, prompt: &Prompt, config: &GenerationConfig) -> Result<GenerationResult>;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Which OpenAI endpoint to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMode {
    Completions,
    Chat,
}

impl ApiMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "completions" => Ok(ApiMode::Completions),
            "chat" => Ok(ApiMode::Chat),
            other => Err(AppError::Configuration {
                message: format!("Unknown llm.mode: {}", other),
            }),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: Option<String>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    model: Option<String>,
    usage: Option<TokenUsage>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    model: Option<String>,
    usage: Option<TokenUsage>,
}

/// OpenAI client
pub struct OpenAIGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    mode: ApiMode,
}

impl OpenAIGenerator {
    /// Create a new generator
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Llm {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            mode: ApiMode::parse(&config.mode)?,
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm {
                message: format!("LLM API request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Llm {
                message: format!("LLM API error {}: {}", status, body),
            });
        }

        Ok(response)
    }

    async fn complete(&self, prompt: &Prompt, config: &GenerationConfig) -> Result<GenerationResult> {
        let request = CompletionRequest {
            model: &self.model,
            prompt: prompt.to_completion_text(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let response: CompletionResponse = self
            .post("completions", &request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Llm {
                message: format!("Failed to parse LLM response: {}", e),
            })?;

        Ok(GenerationResult {
            answer: response.choices.into_iter().next().and_then(|c| c.text),
            model: response.model,
            usage: response.usage,
        })
    }

    async fn chat(&self, prompt: &Prompt, config: &GenerationConfig) -> Result<GenerationResult> {
        let request = ChatRequest {
            model: &self.model,
            messages: prompt.to_messages(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        };

        let response: ChatResponse = self
            .post("chat/completions", &request)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Llm {
                message: format!("Failed to parse LLM response: {}", e),
            })?;

        Ok(GenerationResult {
            answer: response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message)
                .and_then(|m| m.content),
            model: response.model,
            usage: response.usage,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    async fn generate(&self, prompt: &Prompt, config: &GenerationConfig) -> Result<GenerationResult> {
        let start = Instant::now();

        let result = match self.mode {
            ApiMode::Completions => self.complete(prompt, config).await,
            ApiMode::Chat => self.chat(prompt, config).await,
        };

        crate::metrics::record_generation(
            start.elapsed().as_secs_f64(),
            &self.model,
            matches!(&result, Ok(r) if r.answer.is_some()),
        );

        result
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Create the generator described by configuration
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(OpenAIGenerator::new(config)?))
}
