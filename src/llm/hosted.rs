//! Hosted OpenAI-compatible chat completions client.

use crate::llm::client::{GenerationParams, LlmClient};
use crate::types::{AppError, Result};
use async_stream::stream;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct HostedClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Deserialize)]
struct Delta {
    content: Option<String>,
}

/// Drain complete `\n`-terminated lines out of `buffer`, trimmed.
///
/// Any trailing partial line stays in the buffer for the next network
/// chunk; it may end mid-codepoint, which is why the buffer holds bytes and
/// decoding happens per complete line.
fn drain_lines(buffer: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buffer.drain(..=pos).collect();
        lines.push(String::from_utf8_lossy(&line[..pos]).trim().to_string());
    }
    lines
}

impl HostedClient {
    /// Create a client against an OpenAI-compatible API root, e.g.
    /// `https://api.openai.com/v1`.
    pub fn new(api_key: String, api_base: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Generation(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str, params: &GenerationParams, stream: bool) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            stream,
        }
    }

    async fn post(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "chat API returned {}: {}",
                status, text
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for HostedClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let body = self.request_body(prompt, params, false);
        let response = self.post(&body).await?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("malformed chat response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Generation("chat response contained no choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn stream(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<BoxStream<'static, Result<String>>> {
        let body = self.request_body(prompt, params, true);
        let response = self.post(&body).await?;
        let mut bytes = response.bytes_stream();

        // Server-sent events: each line is `data: {json}` or `data: [DONE]`.
        // Chunks can split lines (even mid-codepoint), so buffer raw bytes
        // and only decode complete lines.
        let output = stream! {
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(AppError::Generation(format!("stream error: {}", e)));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                for line in drain_lines(&mut buffer) {
                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }
                    match serde_json::from_str::<StreamChunk>(data) {
                        Ok(parsed) => {
                            if let Some(content) = parsed
                                .choices
                                .into_iter()
                                .next()
                                .and_then(|c| c.delta.content)
                            {
                                if !content.is_empty() {
                                    yield Ok(content);
                                }
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "Skipping unparseable stream event");
                        }
                    }
                }
            }
        };

        Ok(Box::pin(output))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_lines_keeps_partial_line_buffered() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"data: one\ndata: tw");
        assert_eq!(drain_lines(&mut buffer), vec!["data: one".to_string()]);

        buffer.extend_from_slice(b"o\n");
        assert_eq!(drain_lines(&mut buffer), vec!["data: two".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multibyte_codepoint_split_across_chunks_survives() {
        // "é" is 0xC3 0xA9; a network chunk boundary can land between the
        // two bytes. The reassembled line must decode cleanly, with no
        // replacement characters.
        let payload = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n".as_bytes();
        let split = payload.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut buffer = Vec::new();
        buffer.extend_from_slice(&payload[..split]);
        assert!(drain_lines(&mut buffer).is_empty());

        buffer.extend_from_slice(&payload[split..]);
        let lines = drain_lines(&mut buffer);
        assert_eq!(lines.len(), 1);
        assert!(!lines[0].contains('\u{FFFD}'));

        let data = lines[0].strip_prefix("data: ").unwrap();
        let parsed: StreamChunk = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("héllo"));
    }
}
