//! LLM provider clients.
//!
//! A unified interface over generation backends, abstracted behind the
//! [`LlmClient`] trait so the rest of the application never deals with
//! provider-specific APIs.
//!
//! # Supported providers
//!
//! - **Hosted**: any OpenAI-compatible chat completions endpoint, with
//!   streaming via server-sent events
//! - **Ollama**: local inference against an Ollama server, with streaming
//!
//! # Example
//!
//! ```ignore
//! use lore::llm::{GenerationParams, Provider};
//!
//! let provider = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! };
//! let client = provider.create_client().await?;
//! let answer = client.generate("What is 2+2?", &GenerationParams::default()).await?;
//! ```

pub mod client;
pub mod hosted;
pub mod ollama;

pub use client::{GenerationParams, LlmClient, Provider};
