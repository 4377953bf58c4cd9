//! Implementations of the `lore` subcommands.

use crate::cli::output::Output;
use crate::config::LoreConfig;
use crate::llm::LlmClient;
use crate::rag::chunker::RecursiveSplitter;
#[cfg(feature = "local-embeddings")]
use crate::rag::embeddings::LocalEmbedder;
use crate::rag::embeddings::{Embedder, HostedEmbedder};
use crate::rag::index::{BuildOptions, ChunkIndex, SharedIndex};
use crate::rag::pipeline::QaPipeline;
use crate::rag::retriever::Retriever;
use crate::sources;
use crate::types::{Answer, AppError, Chunk, Result};
use futures::StreamExt;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the configured embedder.
fn make_embedder(config: &LoreConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedding.provider.as_str() {
        "hosted" => {
            let api_key = std::env::var(&config.embedding.api_key_env).map_err(|_| {
                AppError::Configuration(format!(
                    "environment variable {} is not set (configure it in .env)",
                    config.embedding.api_key_env
                ))
            })?;
            Ok(Arc::new(HostedEmbedder::new(
                api_key,
                config.embedding.api_base.clone(),
                config.embedding.model.clone(),
                Duration::from_secs(config.embedding.timeout_secs),
            )?))
        }
        #[cfg(feature = "local-embeddings")]
        "local" => Ok(Arc::new(LocalEmbedder::new(&config.embedding.model)?)),
        #[cfg(not(feature = "local-embeddings"))]
        "local" => Err(AppError::Configuration(
            "this build has no local embedding support; rebuild with \
             --features local-embeddings or set embedding.provider = \"hosted\""
                .to_string(),
        )),
        other => Err(AppError::Configuration(format!(
            "unknown embedding.provider {:?}",
            other
        ))),
    }
}

/// Everything `ask` and `chat` need, wired once.
struct QaStack {
    pipeline: QaPipeline,
    embedder: Arc<dyn Embedder>,
}

async fn build_stack(config: &LoreConfig) -> Result<QaStack> {
    let embedder = make_embedder(config)?;
    let index = ChunkIndex::load(&config.index.path, embedder.as_ref()).await?;
    info!(entries = index.len(), path = %config.index.path.display(), "Loaded index");

    let shared = Arc::new(SharedIndex::new(index));
    let retriever = Retriever::new(shared, Arc::clone(&embedder));

    let client: Arc<dyn LlmClient> = config.generation_provider()?.create_client().await?.into();
    let pipeline = QaPipeline::new(
        retriever,
        client,
        config.prompt_template()?,
        config.generation_params(),
        config.retrieval.top_k,
    )?;

    Ok(QaStack { pipeline, embedder })
}

/// `lore index <dir>`
pub async fn index(
    config: &LoreConfig,
    out: &Output,
    dir: &Path,
    extensions: Option<Vec<String>>,
) -> Result<()> {
    out.step(1, 3, &format!("Reading documents from {}", dir.display()));
    let documents = sources::read_dir(dir, extensions.as_deref())?;
    if documents.is_empty() {
        out.warning("No matching documents found");
    }
    out.kv("documents", &documents.len().to_string());

    out.step(2, 3, "Chunking and embedding");
    let splitter = RecursiveSplitter::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    let chunks: Vec<Chunk> = documents
        .iter()
        .flat_map(|doc| splitter.split_document(doc))
        .collect();
    out.kv("chunks", &chunks.len().to_string());

    let embedder = make_embedder(config)?;
    let options = BuildOptions {
        batch_size: config.embedding.batch_size,
        concurrency: config.embedding.concurrency,
    };
    let index = ChunkIndex::build(embedder.as_ref(), chunks, &options).await?;

    out.step(3, 3, &format!("Saving index to {}", config.index.path.display()));
    index.save(&config.index.path).await?;

    out.success(&format!(
        "Indexed {} chunks ({} dimensions, model {})",
        index.len(),
        index.dimensions(),
        embedder.id()
    ));
    Ok(())
}

/// `lore ask <question>`
pub async fn ask(
    config: &LoreConfig,
    out: &Output,
    question: &str,
    stream: bool,
    top_k: Option<usize>,
    show_sources: bool,
) -> Result<()> {
    let stack = build_stack(config).await?;

    let chunks = if stream {
        let mut streaming = stack.pipeline.answer_stream(question, top_k).await?;
        while let Some(fragment) = streaming.stream.next().await {
            print!("{}", fragment?);
            std::io::stdout().flush().ok();
        }
        out.newline();
        streaming.chunks
    } else {
        let answer = stack.pipeline.answer(question, top_k).await?;
        println!("{}", answer.text);
        answer.chunks
    };

    if show_sources {
        print_sources(out, &chunks);
    }
    Ok(())
}

/// `lore chat`
pub async fn chat(config: &LoreConfig, out: &Output) -> Result<()> {
    let stack = build_stack(config).await?;

    out.banner();
    out.info("Ask a question, or `quit` to leave, `:reload` to reload the index");
    out.newline();

    let stdin = std::io::stdin();
    loop {
        out.prompt();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();

        match line {
            "" => continue,
            "quit" | "exit" => break,
            ":reload" => {
                match ChunkIndex::load(&config.index.path, stack.embedder.as_ref()).await {
                    Ok(index) => {
                        let entries = index.len();
                        stack.pipeline.retriever().index().replace(index);
                        out.success(&format!("Reloaded index ({} chunks)", entries));
                    }
                    Err(e) => out.error(&format!("Reload failed: {}", e)),
                }
                continue;
            }
            question => match stack.pipeline.answer(question, None).await {
                Ok(Answer { text, chunks }) => {
                    println!("{}", text);
                    print_sources(out, &chunks);
                    out.newline();
                }
                Err(e) => out.error(&e.to_string()),
            },
        }
    }

    out.info("Goodbye");
    Ok(())
}

fn print_sources(out: &Output, chunks: &[Chunk]) {
    if chunks.is_empty() {
        out.hint("No context was retrieved for this answer");
        return;
    }
    out.header("Sources");
    for chunk in chunks {
        let label = format!("{} #{}", chunk.metadata.source, chunk.seq);
        out.source(&label, &excerpt(&chunk.text, 80));
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let one_line: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if one_line.chars().count() <= max_chars {
        one_line
    } else {
        let cut: String = one_line.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_collapses_whitespace_and_truncates() {
        assert_eq!(excerpt("a  b\nc", 80), "a b c");
        let long = "word ".repeat(50);
        let cut = excerpt(&long, 20);
        assert_eq!(cut.chars().count(), 21); // 20 + ellipsis
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_make_embedder_rejects_unknown_provider() {
        let mut config = LoreConfig::default();
        config.embedding.provider = "carrier-pigeon".to_string();
        assert!(matches!(
            make_embedder(&config),
            Err(AppError::Configuration(_))
        ));
    }
}
