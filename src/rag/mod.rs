//! Retrieval Augmented Generation (RAG) pipeline.
//!
//! The core components for answering questions from a local document
//! collection:
//!
//! - [`rag::chunker`](crate::rag::chunker) - Lossless recursive text chunking
//! - [`rag::embeddings`](crate::rag::embeddings) - Embedding backends (hosted API, local fastembed)
//! - [`rag::index`](crate::rag::index) - The persistent chunk index and its shared handle
//! - [`rag::retriever`](crate::rag::retriever) - Query-time top-k similarity search
//! - [`rag::pipeline`](crate::rag::pipeline) - Prompt assembly and answer generation
//!
//! # Pipeline flow
//!
//! 1. **Ingestion** - Documents are chunked and embedded
//! 2. **Storage** - Vectors and chunks persisted as one index snapshot
//! 3. **Retrieval** - Query embedded, most similar chunks retrieved
//! 4. **Generation** - LLM answers with the retrieved context in its prompt
//!
//! # Example
//!
//! ```ignore
//! use lore::rag::chunker::RecursiveSplitter;
//! use lore::rag::index::{BuildOptions, ChunkIndex};
//!
//! let splitter = RecursiveSplitter::new(1000, 200)?;
//! let chunks: Vec<_> = documents
//!     .iter()
//!     .flat_map(|d| splitter.split_document(d))
//!     .collect();
//!
//! let index = ChunkIndex::build(&embedder, chunks, &BuildOptions::default()).await?;
//! index.save(&path).await?;
//! ```

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod pipeline;
pub mod retriever;
