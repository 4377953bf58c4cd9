//! Core types: documents, chunks, retrieval results, answers, and the
//! application error taxonomy.

use serde::{Deserialize, Serialize};

// ============= Document Types =============

/// An opaque unit of source text with provenance metadata.
///
/// Immutable once created; the chunker is the only consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Full source text.
    pub text: String,
    /// Provenance of the text.
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document from text and a source identifier.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: DocumentMetadata {
                source: source.into(),
                page: None,
            },
        }
    }

    /// Attach a page/sequence number to the document's metadata.
    pub fn with_page(mut self, page: u32) -> Self {
        self.metadata.page = Some(page);
        self
    }
}

/// Provenance metadata carried from a document into its chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Source identifier, e.g. a file path.
    pub source: String,
    /// Page or sequence number within the source, if applicable.
    pub page: Option<u32>,
}

/// A bounded, overlap-aware substring of a document, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text.
    pub text: String,
    /// Metadata carried over from the parent document.
    pub metadata: DocumentMetadata,
    /// Stable index of this chunk within its parent document.
    pub seq: usize,
    /// Number of leading characters repeated from the previous chunk of the
    /// same document (0 for the first chunk). Stripping this prefix from
    /// every chunk and concatenating reconstructs the document text.
    pub lead_overlap: usize,
}

// ============= Retrieval Types =============

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Similarity to the query (higher is more similar).
    pub score: f32,
}

/// Ordered retrieval results, highest similarity first.
pub type RetrievalResult = Vec<ScoredChunk>;

/// A generated answer plus the chunks that were in its prompt context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The model's raw generated text, unmodified.
    pub text: String,
    /// The chunks included in the prompt, in retrieval order. Empty when
    /// retrieval found nothing; that is a valid outcome, not an error.
    pub chunks: Vec<Chunk>,
}

// ============= Error Types =============

/// Application-wide error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid configuration (bad chunk sizes, malformed template, missing
    /// API key). Fatal at startup, never silently defaulted.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The embedding capability failed or returned unusable vectors.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The generation capability failed or timed out. Propagated to the
    /// caller; the pipeline performs no hidden retries.
    #[error("Generation error: {0}")]
    Generation(String),

    /// A stored index is missing, unreadable, or incompatible with the
    /// configured embedder. The caller may rebuild from source documents.
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// Invalid caller input (e.g. `k == 0`).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Index error that is none of the above.
    #[error("Index error: {0}")]
    Index(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lore_vector::Error> for AppError {
    fn from(err: lore_vector::Error) -> Self {
        use lore_vector::Error as E;
        match err {
            E::CorruptIndex(msg) => AppError::CorruptIndex(msg),
            E::InvalidArgument(msg) => AppError::InvalidInput(msg),
            E::DimensionMismatch { expected, actual } => AppError::Index(format!(
                "dimension mismatch: expected {}, got {}",
                expected, actual
            )),
            E::Persistence(msg) => AppError::Index(msg),
            E::Io(e) => AppError::Io(e),
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, AppError>;
