//! Mock implementations for testing.
//!
//! This module provides a deterministic in-process embedder and a scripted
//! LLM client that can be used across different test files without
//! duplication. Neither touches the network.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use lore::llm::{GenerationParams, LlmClient};
use lore::rag::embeddings::Embedder;
use lore::types::{AppError, Result};
use std::time::Duration;

/// Deterministic bag-of-words embedder.
///
/// Each lowercase word is hashed into one of 64 buckets and counted, then
/// the vector is returned un-normalized (the index normalizes). Texts that
/// share words get geometrically close vectors, which is enough structure
/// for retrieval tests to rank on-topic chunks above off-topic ones without
/// a real model.
pub struct StubEmbedder;

pub const STUB_DIMS: usize = 64;

fn bucket(word: &str) -> usize {
    // FNV-1a over the lowercased word
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in word.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (h % STUB_DIMS as u64) as usize
}

fn embed_text(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; STUB_DIMS];
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        v[bucket(word)] += 1.0;
    }
    v
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| embed_text(t)).collect())
    }

    fn id(&self) -> &str {
        "stub-bow-64"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(STUB_DIMS)
    }
}

/// Embedder wrapper that reports a different identity, for compatibility
/// checks at index load time.
pub struct RenamedEmbedder {
    pub id: String,
}

#[async_trait]
impl Embedder for RenamedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        StubEmbedder.embed(texts).await
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn dimensions(&self) -> Option<usize> {
        Some(STUB_DIMS)
    }
}

/// Scripted LLM client with configurable responses.
///
/// Can return a fixed response, echo the prompt it was given (useful for
/// asserting on prompt assembly), simulate failures, or stall long enough
/// to trip a timeout.
#[derive(Clone)]
pub struct StubLlm {
    response: String,
    echo_prompt: bool,
    should_fail: bool,
    delay: Option<Duration>,
}

impl StubLlm {
    /// Create a client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            echo_prompt: false,
            should_fail: false,
            delay: None,
        }
    }

    /// Create a client whose "answer" is the prompt it received.
    pub fn echoing() -> Self {
        Self {
            response: String::new(),
            echo_prompt: true,
            should_fail: false,
            delay: None,
        }
    }

    /// Create a client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            echo_prompt: false,
            should_fail: true,
            delay: None,
        }
    }

    /// Make the client sleep before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    async fn respond(&self, prompt: &str) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(AppError::Generation("Stub LLM failure".to_string()));
        }
        Ok(if self.echo_prompt {
            prompt.to_string()
        } else {
            self.response.clone()
        })
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        self.respond(prompt).await
    }

    async fn stream(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let response = self.respond(prompt).await?;

        // Split response into fragments for streaming simulation
        let fragments: Vec<String> = response
            .chars()
            .collect::<Vec<_>>()
            .chunks(5)
            .map(|c| c.iter().collect())
            .collect();

        Ok(stream::iter(fragments.into_iter().map(Ok)).boxed())
    }

    fn model_name(&self) -> &str {
        "stub-model"
    }
}
