//! TOML-based configuration for L.O.R.E.
//!
//! Declarative configuration for chunking, retrieval, the index location,
//! and the embedding/generation backends via a TOML file (`lore.toml`).
//! API keys never live in the file; each backend section names the
//! environment variable to read (loaded through `.env` by the binary).

use crate::llm::{GenerationParams, Provider};
use crate::rag::pipeline::{DEFAULT_PROMPT_TEMPLATE, DEFAULT_TOP_K, PromptTemplate};
use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from lore.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoreConfig {
    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub prompt: PromptConfig,
}

// ============= Chunking Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

// ============= Retrieval Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks placed in the prompt context.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

// ============= Index Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Where the index snapshot is saved and loaded.
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/index.json")
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

// ============= Embedding Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// `local` (fastembed, requires the `local-embeddings` feature) or
    /// `hosted` (OpenAI-compatible embeddings API).
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable name containing the API key (hosted only).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Concurrent embedding requests during index builds.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_provider() -> String {
    "local".to_string()
}

fn default_embedding_model() -> String {
    "BAAI/bge-small-en-v1.5".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_batch_size() -> usize {
    64
}

fn default_concurrency() -> usize {
    4
}

fn default_embedding_timeout_secs() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

// ============= Generation Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// `hosted` (OpenAI-compatible chat API) or `ollama` (local server).
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable name containing the API key (hosted only).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Ollama server URL (ollama only).
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_generation_provider() -> String {
    "hosted".to_string()
}

fn default_generation_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

fn default_generation_timeout_secs() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            ollama_url: default_ollama_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

// ============= Prompt Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Prompt template; must contain `{context}` and `{question}`.
    #[serde(default = "default_template")]
    pub template: String,
}

fn default_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
        }
    }
}

// ============= Loading and Validation =============

impl LoreConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// anything the file leaves out. A missing file means all defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)
                .map_err(|e| AppError::Configuration(format!("{}: {}", path.display(), e)))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| AppError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot work before anything runs.
    fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(AppError::Configuration(
                "chunking.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::Configuration(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(AppError::Configuration(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        match self.embedding.provider.as_str() {
            "local" | "hosted" => {}
            other => {
                return Err(AppError::Configuration(format!(
                    "unknown embedding.provider {:?} (expected \"local\" or \"hosted\")",
                    other
                )))
            }
        }
        match self.generation.provider.as_str() {
            "hosted" | "ollama" => {}
            other => {
                return Err(AppError::Configuration(format!(
                    "unknown generation.provider {:?} (expected \"hosted\" or \"ollama\")",
                    other
                )))
            }
        }
        // Catches malformed templates at startup rather than first question
        PromptTemplate::new(&self.prompt.template)?;
        Ok(())
    }

    /// The validated prompt template.
    pub fn prompt_template(&self) -> Result<PromptTemplate> {
        PromptTemplate::new(&self.prompt.template)
    }

    /// Generation sampling parameters from the `[generation]` section.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
            timeout: Duration::from_secs(self.generation.timeout_secs),
        }
    }

    /// The generation provider, with its API key resolved from the
    /// environment. Missing key for a hosted provider is a configuration
    /// error; Ollama needs none.
    pub fn generation_provider(&self) -> Result<Provider> {
        match self.generation.provider.as_str() {
            "hosted" => Ok(Provider::Hosted {
                api_key: self.require_env(&self.generation.api_key_env)?,
                api_base: self.generation.api_base.clone(),
                model: self.generation.model.clone(),
            }),
            "ollama" => Ok(Provider::Ollama {
                base_url: self.generation.ollama_url.clone(),
                model: self.generation.model.clone(),
            }),
            other => Err(AppError::Configuration(format!(
                "unknown generation.provider {:?}",
                other
            ))),
        }
    }

    fn require_env(&self, var: &str) -> Result<String> {
        std::env::var(var).map_err(|_| {
            AppError::Configuration(format!(
                "environment variable {} is not set (configure it in .env)",
                var
            ))
        })
    }
}
