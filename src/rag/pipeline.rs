//! The question-answering pipeline: retrieve, assemble a prompt, generate.

use crate::llm::{GenerationParams, LlmClient};
use crate::rag::retriever::Retriever;
use crate::types::{Answer, AppError, Chunk, Result};
use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default grounded-answering prompt.
pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
You are a helpful assistant. Use the following pieces of retrieved context \
to answer the question at the end. If the context does not contain the \
answer, say that you don't know; do not make one up.

<context>
{context}
</context>

Question: {question}

Answer:";

/// Number of chunks placed in the prompt when the caller does not say.
pub const DEFAULT_TOP_K: usize = 4;

/// A prompt template with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Validate and wrap a template string.
    ///
    /// Both placeholders must be present; a template that silently drops the
    /// context or the question produces confidently ungrounded answers, so
    /// this is a configuration error caught at startup.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in ["{context}", "{question}"] {
            if !template.contains(placeholder) {
                return Err(AppError::Configuration(format!(
                    "prompt template is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(Self { template })
    }

    /// Fill in the placeholders.
    ///
    /// Single pass over the template, so placeholder-shaped text inside the
    /// substituted values is never re-expanded.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();
        loop {
            let ctx_pos = rest.find("{context}");
            let q_pos = rest.find("{question}");
            let (pos, placeholder, value) = match (ctx_pos, q_pos) {
                (Some(c), Some(q)) if c < q => (c, "{context}", context),
                (Some(c), None) => (c, "{context}", context),
                (_, Some(q)) => (q, "{question}", question),
                (None, None) => break,
            };
            out.push_str(&rest[..pos]);
            out.push_str(value);
            rest = &rest[pos + placeholder.len()..];
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        // The default template carries both placeholders.
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// An answer being streamed: the chunks are known up front, the text arrives
/// incrementally.
pub struct StreamingAnswer {
    /// The chunks included in the prompt, in retrieval order.
    pub chunks: Vec<Chunk>,
    /// Incremental fragments of the generated text.
    pub stream: BoxStream<'static, Result<String>>,
}

/// Retrieval-augmented question answering over an indexed corpus.
pub struct QaPipeline {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
    template: PromptTemplate,
    params: GenerationParams,
    top_k: usize,
}

impl QaPipeline {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmClient>,
        template: PromptTemplate,
        params: GenerationParams,
        top_k: usize,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(AppError::Configuration(
                "top_k must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            retriever,
            llm,
            template,
            params,
            top_k,
        })
    }

    /// Answer `question` from the indexed corpus.
    ///
    /// `k` overrides the configured `top_k` for this call; `None` uses the
    /// configured value. Zero retrieved chunks is a valid outcome: the model
    /// is asked with an empty context block and `Answer.chunks` comes back
    /// empty. Generation is bounded by the configured timeout; on expiry the
    /// error propagates, there are no hidden retries.
    #[instrument(skip(self), fields(model = self.llm.model_name()))]
    pub async fn answer(&self, question: &str, k: Option<usize>) -> Result<Answer> {
        let (prompt, chunks) = self.prepare(question, k).await?;

        let text = tokio::time::timeout(self.params.timeout, self.llm.generate(&prompt, &self.params))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "generation timed out after {:?}",
                    self.params.timeout
                ))
            })??;

        info!(chunks = chunks.len(), answer_chars = text.len(), "Answered question");
        Ok(Answer { text, chunks })
    }

    /// Like [`answer`](Self::answer), but yields generated text incrementally.
    ///
    /// The timeout bounds starting the stream; once fragments are flowing the
    /// caller controls how long it listens.
    #[instrument(skip(self), fields(model = self.llm.model_name()))]
    pub async fn answer_stream(&self, question: &str, k: Option<usize>) -> Result<StreamingAnswer> {
        let (prompt, chunks) = self.prepare(question, k).await?;

        let llm = Arc::clone(&self.llm);
        let params = self.params.clone();
        let stream = tokio::time::timeout(self.params.timeout, async move {
            llm.stream(&prompt, &params).await
        })
        .await
        .map_err(|_| {
            AppError::Generation(format!(
                "generation timed out after {:?}",
                self.params.timeout
            ))
        })??;

        Ok(StreamingAnswer { chunks, stream })
    }

    /// Retrieve and render: the shared front half of both answer paths.
    async fn prepare(&self, question: &str, k: Option<usize>) -> Result<(String, Vec<Chunk>)> {
        let scored = self.retriever.retrieve(question, k.unwrap_or(self.top_k)).await?;
        debug!(retrieved = scored.len(), "Retrieved context chunks");

        let chunks: Vec<Chunk> = scored.into_iter().map(|s| s.chunk).collect();
        let context = assemble_context(&chunks);
        let prompt = self.template.render(&context, question);
        Ok((prompt, chunks))
    }

    /// The shared index handle, for reload/swap by the caller.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}

/// Join chunk texts into one context block, each labeled with its provenance
/// so the model (and anyone reading the prompt) can tell the sources apart.
fn assemble_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("[{} #{}]\n{}", chunk.metadata.source, chunk.seq, chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;

    #[test]
    fn test_template_requires_both_placeholders() {
        assert!(matches!(
            PromptTemplate::new("just a question: {question}"),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            PromptTemplate::new("context only: {context}"),
            Err(AppError::Configuration(_))
        ));
        assert!(PromptTemplate::new("{context} {question}").is_ok());
        assert!(PromptTemplate::new(DEFAULT_PROMPT_TEMPLATE).is_ok());
    }

    #[test]
    fn test_template_render() {
        let template = PromptTemplate::new("C: {context}\nQ: {question}").unwrap();
        let rendered = template.render("some facts", "what?");
        assert_eq!(rendered, "C: some facts\nQ: what?");
    }

    #[test]
    fn test_render_does_not_recurse_into_substituted_text() {
        let template = PromptTemplate::new("{context}|{question}").unwrap();
        // Context containing a literal "{question}" must survive unchanged.
        let rendered = template.render("has {question} inside", "q");
        assert_eq!(rendered, "has {question} inside|q");
    }

    #[test]
    fn test_assemble_context_labels_chunks() {
        let chunks = vec![
            Chunk {
                text: "first".to_string(),
                metadata: DocumentMetadata {
                    source: "a.txt".to_string(),
                    page: None,
                },
                seq: 0,
                lead_overlap: 0,
            },
            Chunk {
                text: "second".to_string(),
                metadata: DocumentMetadata {
                    source: "b.md".to_string(),
                    page: None,
                },
                seq: 3,
                lead_overlap: 0,
            },
        ];
        let context = assemble_context(&chunks);
        assert_eq!(context, "[a.txt #0]\nfirst\n\n[b.md #3]\nsecond");
        assert!(assemble_context(&[]).is_empty());
    }
}
