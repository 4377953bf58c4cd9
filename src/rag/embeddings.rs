//! Embedding capability: text in, fixed-dimension vector out.
//!
//! The pipeline is written against the [`Embedder`] trait; concrete backends
//! are a hosted OpenAI-compatible embeddings API and, behind the
//! `local-embeddings` feature, fastembed ONNX models running in-process.
//!
//! Embedders return raw model output. Unit-normalization is applied by the
//! index at insertion time, never assumed from the backend.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Maps text to fixed-length embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Stable identity of the embedding model. Recorded in saved indices and
    /// checked at load time: querying an index with a different model than
    /// the one that built it silently returns garbage similarities.
    fn id(&self) -> &str;

    /// Vector dimensionality, if known up front. Hosted APIs typically only
    /// reveal it with the first response.
    fn dimensions(&self) -> Option<usize> {
        None
    }
}

// ============= Hosted (OpenAI-compatible) =============

/// Embedder backed by an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct HostedEmbedder {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(serde::Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Deserialize)]
struct EmbeddingObject {
    index: usize,
    embedding: Vec<f32>,
}

impl HostedEmbedder {
    /// Create a hosted embedder.
    ///
    /// `api_base` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(api_key: String, api_base: String, model: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Embedding(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl Embedder for HostedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("embeddings request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "embeddings API returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("malformed embeddings response: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "embeddings API returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        // The API may reorder entries; restore input order by index.
        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for obj in parsed.data {
            let slot = vectors.get_mut(obj.index).ok_or_else(|| {
                AppError::Embedding(format!("embeddings response index {} out of range", obj.index))
            })?;
            *slot = Some(obj.embedding);
        }
        vectors
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.ok_or_else(|| AppError::Embedding(format!("missing embedding for input {}", i)))
            })
            .collect()
    }

    fn id(&self) -> &str {
        &self.model
    }
}

// ============= Local (fastembed) =============

/// In-process ONNX embedder via fastembed.
///
/// fastembed's `embed` takes `&mut self`, so the model sits behind a mutex;
/// batches serialize through it.
#[cfg(feature = "local-embeddings")]
pub struct LocalEmbedder {
    model: parking_lot::Mutex<fastembed::TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

#[cfg(feature = "local-embeddings")]
impl LocalEmbedder {
    /// Load a local embedding model by name.
    ///
    /// Supported names: `BAAI/bge-small-en-v1.5` (default, 384 dims),
    /// `BAAI/bge-base-en-v1.5` (768), `sentence-transformers/all-MiniLM-L6-v2`
    /// (384).
    pub fn new(model_name: &str) -> Result<Self> {
        use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

        let (model_id, dimensions) = match model_name {
            "BAAI/bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
            "BAAI/bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
            "sentence-transformers/all-MiniLM-L6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
            other => {
                return Err(AppError::Configuration(format!(
                    "unsupported local embedding model: {}",
                    other
                )))
            }
        };

        let model = TextEmbedding::try_new(
            InitOptions::new(model_id).with_show_download_progress(true),
        )
        .map_err(|e| AppError::Embedding(e.to_string()))?;

        Ok(Self {
            model: parking_lot::Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let inputs: Vec<String> = texts.to_vec();
        // CPU-bound inference; keep it off the async reactor threads.
        tokio::task::block_in_place(|| {
            self.model
                .lock()
                .embed(inputs, None)
                .map_err(|e| AppError::Embedding(e.to_string()))
        })
    }

    fn id(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}
