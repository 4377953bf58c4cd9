//! Recursive text chunking for document processing.
//!
//! Documents are split with a priority list of separators (paragraph break,
//! line break, sentence break, word break, then single characters) so that
//! natural text boundaries survive wherever possible. Adjacent small pieces
//! are then merged up to `chunk_size`, with `chunk_overlap` characters of the
//! previous chunk repeated at the start of the next one.
//!
//! Unlike trimming splitters, this one is lossless: every separator stays
//! attached to the piece it terminates, and each [`Chunk`] records how many
//! leading characters were carried over from its predecessor, so
//! [`reconstruct`] can rebuild the original document text exactly.

use crate::types::{AppError, Chunk, Document, Result};

/// Default separator priority, coarse to fine. The trailing empty string is
/// the per-character fallback that guarantees no chunk exceeds `chunk_size`.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Splits text into overlapping chunks sized for an embedding context window.
///
/// All sizes are measured in characters. The same input and configuration
/// always produce the same chunk sequence.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveSplitter {
    /// Create a splitter.
    ///
    /// # Errors
    ///
    /// `chunk_size == 0` or `chunk_overlap >= chunk_size` is a configuration
    /// error.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(AppError::Configuration(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the separator priority list.
    ///
    /// Without a trailing `""` fallback, a single unsplittable unit longer
    /// than `chunk_size` is emitted whole rather than fractured mid-token.
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    /// Split raw text into chunk strings with their lead-overlap lengths.
    pub fn split_text(&self, text: &str) -> Vec<(String, usize)> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut pieces = Vec::new();
        self.split_recursive(text, 0, &mut pieces);
        self.merge(pieces)
    }

    /// Split a document into chunks carrying its metadata.
    pub fn split_document(&self, document: &Document) -> Vec<Chunk> {
        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(seq, (text, lead_overlap))| Chunk {
                text,
                metadata: document.metadata.clone(),
                seq,
                lead_overlap,
            })
            .collect()
    }

    /// Recursively cut `text` into pieces no longer than `chunk_size`,
    /// trying the coarsest remaining separator first. Concatenating the
    /// produced pieces reproduces `text` exactly.
    fn split_recursive(&self, text: &str, sep_idx: usize, out: &mut Vec<String>) {
        let Some(sep) = self.separators.get(sep_idx) else {
            // No finer separator left: keep the unit whole.
            out.push(text.to_string());
            return;
        };

        if sep.is_empty() {
            // Character-level fallback.
            let chars: Vec<char> = text.chars().collect();
            for slice in chars.chunks(self.chunk_size) {
                out.push(slice.iter().collect());
            }
            return;
        }

        for piece in split_keeping_separator(text, sep) {
            if char_len(&piece) <= self.chunk_size {
                out.push(piece);
            } else {
                self.split_recursive(&piece, sep_idx + 1, out);
            }
        }
    }

    /// Pack pieces into chunks of at most `chunk_size` characters, carrying
    /// up to `chunk_overlap` trailing characters (whole pieces only) into
    /// the start of the next chunk.
    fn merge(&self, pieces: Vec<String>) -> Vec<(String, usize)> {
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0usize;
        let mut lead = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);

            if !current.is_empty() && current_len + piece_len > self.chunk_size {
                chunks.push((current.concat(), lead));

                // Carry trailing pieces up to chunk_overlap characters,
                // shrinking further if the incoming piece would not fit.
                let mut keep: Vec<String> = Vec::new();
                let mut keep_len = 0usize;
                for prev in current.iter().rev() {
                    let prev_len = char_len(prev);
                    if keep_len + prev_len > self.chunk_overlap {
                        break;
                    }
                    keep_len += prev_len;
                    keep.push(prev.clone());
                }
                keep.reverse();
                while !keep.is_empty() && keep_len + piece_len > self.chunk_size {
                    keep_len -= char_len(&keep.remove(0));
                }

                lead = keep_len;
                current = keep;
                current_len = keep_len;
            }

            current_len += piece_len;
            current.push(piece);
        }

        // The tail always contains at least one fresh piece; a pure-overlap
        // chunk would duplicate text on reconstruction.
        if current_len > lead {
            chunks.push((current.concat(), lead));
        }

        chunks
    }
}

/// Rebuild the original document text from its chunks by stripping each
/// chunk's lead overlap and concatenating.
pub fn reconstruct(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    for chunk in chunks {
        let skip_bytes = chunk
            .text
            .char_indices()
            .nth(chunk.lead_overlap)
            .map(|(i, _)| i)
            .unwrap_or(chunk.text.len());
        text.push_str(&chunk.text[skip_bytes..]);
    }
    text
}

/// Split `text` on `sep`, keeping the separator attached to the piece it
/// terminates. `sep` must be non-empty.
fn split_keeping_separator(text: &str, sep: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while let Some(pos) = text[start..].find(sep) {
        let end = start + pos + sep.len();
        pieces.push(text[start..end].to_string());
        start = end;
    }
    if start < text.len() {
        pieces.push(text[start..].to_string());
    }
    pieces
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(size: usize, overlap: usize) -> RecursiveSplitter {
        RecursiveSplitter::new(size, overlap).unwrap()
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        assert!(matches!(
            RecursiveSplitter::new(100, 100),
            Err(AppError::Configuration(_))
        ));
        assert!(matches!(
            RecursiveSplitter::new(100, 150),
            Err(AppError::Configuration(_))
        ));
        assert!(RecursiveSplitter::new(100, 99).is_ok());
    }

    #[test]
    fn test_empty_document_yields_no_chunks() {
        let doc = Document::new("", "empty.txt");
        assert!(splitter(100, 20).split_document(&doc).is_empty());
    }

    #[test]
    fn test_short_text_is_a_single_chunk() {
        let chunks = splitter(1000, 200).split_text("Qlora is a method for efficient fine-tuning.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0, "Qlora is a method for efficient fine-tuning.");
        assert_eq!(chunks[0].1, 0);
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let text = "word ".repeat(200);
        for (chunk, _) in splitter(40, 10).split_text(&text) {
            assert!(chunk.chars().count() <= 40, "oversize chunk: {:?}", chunk);
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let text = "first paragraph here.\n\nsecond paragraph here.";
        let chunks = splitter(25, 0).split_text(text);
        assert_eq!(chunks[0].0, "first paragraph here.\n\n");
        assert_eq!(chunks[1].0, "second paragraph here.");
    }

    #[test]
    fn test_lossless_reconstruction() {
        let text = "Alpha beta gamma delta.\nEpsilon zeta eta theta iota kappa.\n\n\
                    Lambda mu nu xi omicron pi rho. Sigma tau upsilon phi chi psi omega.\n";
        let doc = Document::new(text, "greek.txt");
        for (size, overlap) in [(20, 5), (30, 10), (50, 20), (1000, 200)] {
            let chunks = splitter(size, overlap).split_document(&doc);
            assert_eq!(reconstruct(&chunks), text, "size={} overlap={}", size, overlap);
        }
    }

    #[test]
    fn test_overlap_is_a_suffix_of_previous_chunk() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let chunks = splitter(20, 8).split_text(text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let (prev, _) = &pair[0];
            let (next, lead) = &pair[1];
            let lead_bytes = next
                .char_indices()
                .nth(*lead)
                .map(|(i, _)| i)
                .unwrap_or(next.len());
            assert!(prev.ends_with(&next[..lead_bytes]));
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Some repeated content. ".repeat(50);
        let a = splitter(100, 25).split_text(&text);
        let b = splitter(100, 25).split_text(&text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_character_fallback_cuts_long_words() {
        let text = "x".repeat(95);
        let chunks = splitter(30, 0).split_text(&text);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|(c, _)| c.chars().count() <= 30));
        assert_eq!(
            chunks.iter().map(|(c, _)| c.chars().count()).sum::<usize>(),
            95
        );
    }

    #[test]
    fn test_unsplittable_unit_kept_whole_without_fallback() {
        let text = "short line\nA".to_string() + &"a".repeat(50) + "\nshort line";
        let chunks = splitter(20, 0)
            .with_separators(vec!["\n".to_string()])
            .split_text(&text);
        assert!(chunks.iter().any(|(c, _)| c.chars().count() > 20));
        let doc_chunks: Vec<Chunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(seq, (text, lead_overlap))| Chunk {
                text,
                metadata: crate::types::DocumentMetadata {
                    source: "t".into(),
                    page: None,
                },
                seq,
                lead_overlap,
            })
            .collect();
        assert_eq!(reconstruct(&doc_chunks), text);
    }

    #[test]
    fn test_multibyte_text_counts_characters_not_bytes() {
        let text = "héllo wörld «très» çédille über naïve ".repeat(10);
        let chunks = splitter(25, 5).split_text(&text);
        for (chunk, _) in &chunks {
            assert!(chunk.chars().count() <= 25);
        }
        let doc = Document::new(text.clone(), "utf8.txt");
        let chunks = splitter(25, 5).split_document(&doc);
        assert_eq!(reconstruct(&chunks), text);
    }

    #[test]
    fn test_chunk_seq_is_stable() {
        let doc = Document::new("a b c d e f g h i j k l m n o p", "seq.txt");
        let chunks = splitter(8, 2).split_document(&doc);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.seq, i);
            assert_eq!(chunk.metadata.source, "seq.txt");
        }
    }
}
