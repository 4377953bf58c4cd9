//! Query-time retrieval: embed the question, search the live index.

use crate::rag::embeddings::Embedder;
use crate::rag::index::SharedIndex;
use crate::types::{AppError, Result, RetrievalResult};
use lore_vector::normalize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds queries and runs top-k similarity search against the current
/// [`SharedIndex`] snapshot.
pub struct Retriever {
    index: Arc<SharedIndex>,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(index: Arc<SharedIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self { index, embedder }
    }

    /// Return the `k` chunks most similar to `query`, best first.
    ///
    /// Fewer than `k` results come back when the index is smaller than `k`;
    /// an empty index yields an empty result, not an error. The query is
    /// unit-normalized with the same routine applied at indexing time, so
    /// scores are cosine similarities.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("query must not be empty".to_string()));
        }
        if k == 0 {
            return Err(AppError::InvalidInput("k must be at least 1".to_string()));
        }

        let index = self.index.current();
        if index.is_empty() {
            debug!("Index is empty, returning no results");
            return Ok(Vec::new());
        }

        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let mut query_vector = vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("embedder returned no vector for query".to_string()))?;
        normalize(&mut query_vector);

        index.search(&query_vector, k)
    }

    /// The shared index handle, for reload/swap by the caller.
    pub fn index(&self) -> &Arc<SharedIndex> {
        &self.index
    }
}
