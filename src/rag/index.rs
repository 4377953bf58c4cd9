//! The chunk index: embeds chunks, stores them in a dense-vector index, and
//! answers top-k similarity queries. Persistence and the exact-search
//! contract come from `lore-vector`; this layer adds embedding, unit
//! normalization, and embedder-compatibility checks.

use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Chunk, Result, RetrievalResult, ScoredChunk};
use arc_swap::ArcSwap;
use futures::StreamExt;
use lore_vector::{normalize, DenseIndex, DistanceMetric};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Snapshot attribute recording which embedding model built the index.
const ATTR_EMBEDDER: &str = "embedder";

/// Knobs for index construction.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Number of chunks per embedding request.
    pub batch_size: usize,
    /// Number of embedding requests in flight at once. Batches complete in
    /// order regardless, so concurrency never affects entry ids.
    pub concurrency: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            batch_size: 64,
            concurrency: 4,
        }
    }
}

/// An immutable index of (chunk, embedding) pairs supporting top-k search.
///
/// Vectors are unit-normalized at build time, so the default dot-product
/// metric computes cosine similarity with a single multiply-accumulate pass.
pub struct ChunkIndex {
    inner: DenseIndex<Chunk>,
}

impl ChunkIndex {
    /// Embed `chunks` and build an index over them.
    ///
    /// Embedding runs as an order-preserving concurrent map over batches;
    /// the final bulk insertion is single-writer and happens in chunk order,
    /// which is what makes search tie-breaking deterministic. A vector of
    /// unexpected dimension anywhere aborts the whole build.
    #[instrument(skip(embedder, chunks), fields(chunks = chunks.len(), embedder = embedder.id()))]
    pub async fn build(
        embedder: &dyn Embedder,
        chunks: Vec<Chunk>,
        options: &BuildOptions,
    ) -> Result<Self> {
        let batch_size = options.batch_size.max(1);
        let batches: Vec<Vec<String>> = chunks
            .chunks(batch_size)
            .map(|batch| batch.iter().map(|c| c.text.clone()).collect())
            .collect();

        // Embarrassingly parallel map; `buffered` preserves batch order.
        let results: Vec<Result<Vec<Vec<f32>>>> = futures::stream::iter(
            batches
                .into_iter()
                .map(|batch| async move { embedder.embed(&batch).await }),
        )
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for result in results {
            vectors.extend(result?);
        }
        if vectors.len() != chunks.len() {
            return Err(AppError::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimensions = match (embedder.dimensions(), vectors.first()) {
            (Some(d), _) => d,
            (None, Some(v)) => v.len(),
            (None, None) => {
                return Err(AppError::Embedding(
                    "cannot size an empty index: embedder does not report dimensions".to_string(),
                ))
            }
        };
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::Embedding(format!(
                    "chunk {} embedded to {} dimensions, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
        }
        for vector in vectors.iter_mut() {
            normalize(vector);
        }

        let mut inner = DenseIndex::new(dimensions, DistanceMetric::DotProduct)?;
        inner.set_attribute(ATTR_EMBEDDER, embedder.id());
        inner.insert_batch(vectors.into_iter().zip(chunks))?;

        info!(entries = inner.len(), dimensions, "Built chunk index");
        Ok(Self { inner })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Vector dimensionality.
    pub fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    /// Return the `k` chunks most similar to `query_vector`, best first.
    ///
    /// `query_vector` must already be unit-normalized (the [`Retriever`]
    /// does this). `k > len` is clamped; `k == 0` is invalid input.
    ///
    /// [`Retriever`]: crate::rag::retriever::Retriever
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<RetrievalResult> {
        let hits = self.inner.search(query_vector, k)?;
        debug!(k, hits = hits.len(), "Index search");
        Ok(hits
            .into_iter()
            .map(|hit| ScoredChunk {
                chunk: hit.payload,
                score: hit.score,
            })
            .collect())
    }

    /// Persist the index atomically to `path`.
    pub async fn save(&self, path: &Path) -> Result<()> {
        self.inner.save(path).await?;
        Ok(())
    }

    /// Load an index from `path`, verifying it matches `embedder`.
    ///
    /// A missing/unreadable snapshot, a stored embedder identity different
    /// from the configured one, or a dimensionality the embedder disagrees
    /// with are all [`AppError::CorruptIndex`]: querying such an index would
    /// silently return garbage similarities.
    pub async fn load(path: &Path, embedder: &dyn Embedder) -> Result<Self> {
        let inner = DenseIndex::<Chunk>::load(path).await?;

        match inner.attributes().get(ATTR_EMBEDDER) {
            Some(stored) if stored == embedder.id() => {}
            Some(stored) => {
                return Err(AppError::CorruptIndex(format!(
                    "index at {} was built with embedder {:?} but {:?} is configured",
                    path.display(),
                    stored,
                    embedder.id()
                )))
            }
            None => {
                return Err(AppError::CorruptIndex(format!(
                    "index at {} does not record its embedder",
                    path.display()
                )))
            }
        }
        if let Some(expected) = embedder.dimensions() {
            if expected != inner.dimensions() {
                return Err(AppError::CorruptIndex(format!(
                    "index at {} stores {}-dimensional vectors but embedder {:?} produces {}",
                    path.display(),
                    inner.dimensions(),
                    embedder.id(),
                    expected
                )));
            }
        }

        Ok(Self { inner })
    }
}

/// A swappable handle to the live [`ChunkIndex`].
///
/// Readers grab an `Arc` snapshot and keep using it for the duration of a
/// query; a rebuild or reload publishes a whole new index with one atomic
/// pointer swap, so in-flight searches never observe a half-updated
/// structure.
pub struct SharedIndex {
    inner: ArcSwap<ChunkIndex>,
}

impl SharedIndex {
    /// Wrap an index for shared use.
    pub fn new(index: ChunkIndex) -> Self {
        Self {
            inner: ArcSwap::from_pointee(index),
        }
    }

    /// Get the current index snapshot.
    pub fn current(&self) -> Arc<ChunkIndex> {
        self.inner.load_full()
    }

    /// Atomically replace the live index.
    pub fn replace(&self, index: ChunkIndex) {
        self.inner.store(Arc::new(index));
    }
}
