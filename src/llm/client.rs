//! LLM client abstraction and provider selection.
//!
//! The pipeline talks to the [`LlmClient`] trait; concrete backends are an
//! OpenAI-compatible hosted chat API and Ollama for local inference. Both
//! support streaming.

use crate::types::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::time::Duration;

/// Sampling and bounding parameters for a single generation request.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Wall-clock bound on the whole request. Enforced by the pipeline with
    /// a timer around the call, not trusted to the backend.
    pub timeout: Duration,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Generic LLM client trait for provider abstraction.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion from a prompt.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Stream a completion as incremental text fragments.
    async fn stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BoxStream<'static, Result<String>>>;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;
}

/// Provider enum for runtime selection.
#[derive(Debug, Clone)]
pub enum Provider {
    /// Hosted OpenAI-compatible chat completions API (OpenAI, OpenRouter,
    /// vLLM, and friends).
    Hosted {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider.
    ///
    /// Recommended models: `llama3.2` for general use, `mistral` for fast
    /// inference.
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Create a client instance for this provider.
    pub async fn create_client(&self) -> Result<Box<dyn LlmClient>> {
        match self {
            Provider::Hosted {
                api_key,
                api_base,
                model,
            } => Ok(Box::new(super::hosted::HostedClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            )?)),

            Provider::Ollama { base_url, model } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),
        }
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Hosted { .. } => "Hosted",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        match self {
            Provider::Hosted { model, .. } => model,
            Provider::Ollama { model, .. } => model,
        }
    }
}
