//! Integration tests for document chunking.
//!
//! These exercise the splitter through the public API with realistic
//! documents, focusing on the two contracts retrieval depends on: chunks
//! never exceed the configured size, and the original text is exactly
//! recoverable from the chunk sequence.

use lore::rag::chunker::{reconstruct, RecursiveSplitter};
use lore::types::Document;

const ARTICLE: &str = "\
# Fine-tuning large models

Qlora is a method for efficient fine-tuning of quantized language models. \
It backpropagates gradients through a frozen 4-bit quantized model into \
low-rank adapters.

## Why it matters

Full fine-tuning of a 65B parameter model requires hundreds of gigabytes \
of GPU memory. Qlora reduces this to a single 48GB card while preserving \
task performance.

The approach combines three ideas: 4-bit NormalFloat quantization, double \
quantization of the quantization constants, and paged optimizers to manage \
memory spikes.

## Practical notes

Training data quality matters more than quantity. A small, carefully \
curated instruction dataset routinely beats a large noisy one.
";

#[test]
fn test_article_chunks_fit_and_reconstruct() {
    for (size, overlap) in [(200, 50), (500, 100), (1000, 200)] {
        let splitter = RecursiveSplitter::new(size, overlap).unwrap();
        let doc = Document::new(ARTICLE, "article.md");
        let chunks = splitter.split_document(&doc);

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(
                chunk.text.chars().count() <= size,
                "chunk of {} chars with size {}",
                chunk.text.chars().count(),
                size
            );
            assert_eq!(chunk.metadata.source, "article.md");
        }
        assert_eq!(
            reconstruct(&chunks),
            ARTICLE,
            "reconstruction failed for size={} overlap={}",
            size,
            overlap
        );
    }
}

#[test]
fn test_chunk_sequence_is_deterministic() {
    let splitter = RecursiveSplitter::new(300, 60).unwrap();
    let doc = Document::new(ARTICLE, "article.md");

    let first = splitter.split_document(&doc);
    let second = splitter.split_document(&doc);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.text, b.text);
        assert_eq!(a.seq, b.seq);
        assert_eq!(a.lead_overlap, b.lead_overlap);
    }
}

#[test]
fn test_overlap_carries_context_between_chunks() {
    let splitter = RecursiveSplitter::new(200, 50).unwrap();
    let doc = Document::new(ARTICLE, "article.md");
    let chunks = splitter.split_document(&doc);

    assert!(chunks.len() > 1);
    // At least one non-initial chunk starts with text repeated from its
    // predecessor, and that repetition is recorded.
    assert!(chunks.iter().skip(1).any(|c| c.lead_overlap > 0));
    for pair in chunks.windows(2) {
        let lead = pair[1].lead_overlap;
        if lead > 0 {
            let lead_text: String = pair[1].text.chars().take(lead).collect();
            assert!(pair[0].text.ends_with(&lead_text));
        }
    }
}

#[test]
fn test_whole_corpus_reconstructs_per_document() {
    let splitter = RecursiveSplitter::new(250, 40).unwrap();
    let docs = vec![
        Document::new(ARTICLE, "a.md"),
        Document::new("one tiny note", "b.txt"),
        Document::new("line one\nline two\nline three\n", "c.txt"),
    ];

    for doc in &docs {
        let chunks = splitter.split_document(doc);
        assert_eq!(reconstruct(&chunks), doc.text);
    }
}
