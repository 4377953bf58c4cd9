//! # L.O.R.E - Local Retrieval Engine
//!
//! Retrieval-augmented question answering over a local document collection,
//! built in Rust with hosted and local backends for both embedding and
//! generation.
//!
//! ## Overview
//!
//! L.O.R.E can be used in two ways:
//!
//! 1. **As a CLI** - Run the `lore` binary (`index`, `ask`, `chat`)
//! 2. **As a library** - Import the pipeline components into your own project
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use lore::llm::{GenerationParams, Provider};
//! use lore::rag::chunker::RecursiveSplitter;
//! use lore::rag::index::{BuildOptions, ChunkIndex, SharedIndex};
//! use lore::rag::pipeline::{PromptTemplate, QaPipeline, DEFAULT_TOP_K};
//! use lore::rag::retriever::Retriever;
//! use lore::types::Document;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Chunk and index documents
//!     let splitter = RecursiveSplitter::new(1000, 200)?;
//!     let doc = Document::new("Qlora is a fine-tuning method...", "notes.md");
//!     let chunks = splitter.split_document(&doc);
//!     let index = ChunkIndex::build(&embedder, chunks, &BuildOptions::default()).await?;
//!
//!     // Wire the pipeline
//!     let shared = Arc::new(SharedIndex::new(index));
//!     let retriever = Retriever::new(shared, Arc::new(embedder));
//!     let client = Provider::Ollama {
//!         base_url: "http://localhost:11434".to_string(),
//!         model: "llama3.2".to_string(),
//!     }
//!     .create_client()
//!     .await?;
//!     let pipeline = QaPipeline::new(
//!         retriever,
//!         client.into(),
//!         PromptTemplate::default(),
//!         GenerationParams::default(),
//!         DEFAULT_TOP_K,
//!     )?;
//!
//!     let answer = pipeline.answer("What is Qlora?", None).await?;
//!     println!("{}", answer.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-embeddings` | In-process fastembed ONNX embedding models |
//!
//! ## Modules
//!
//! - [`rag`] - Chunking, embedding, indexing, retrieval, answer generation
//! - [`llm`] - LLM client implementations (hosted API, Ollama)
//! - [`sources`] - Reading source documents from the filesystem
//! - [`config`] - TOML configuration (`lore.toml`)
//! - [`cli`] - Command-line interface
//! - [`types`] - Common types and error handling
//!
//! The vector index itself lives in the `lore-vector` crate: a dense,
//! exactly-searched index with atomic JSON snapshot persistence.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line interface (argument parsing, colored output, commands).
pub mod cli;
/// TOML configuration loaded from `lore.toml`.
pub mod config;
/// LLM provider clients and abstractions.
pub mod llm;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Reading source documents from the filesystem.
pub mod sources;
/// Core types (documents, chunks, answers, errors).
pub mod types;

// Re-export commonly used types
pub use config::LoreConfig;
pub use llm::{GenerationParams, LlmClient, Provider};
pub use rag::chunker::RecursiveSplitter;
pub use rag::embeddings::Embedder;
pub use rag::index::{BuildOptions, ChunkIndex, SharedIndex};
pub use rag::pipeline::{PromptTemplate, QaPipeline};
pub use rag::retriever::Retriever;
pub use types::{Answer, AppError, Chunk, Document, Result, ScoredChunk};
