use crate::error::IngestError;
use crate::models::{Chunk, PageDocument};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

/// Separators tried from coarsest to finest. Text that still exceeds the
/// chunk size after the last one is cut at character boundaries.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

#[derive(Debug, Clone, Copy)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl SplitterConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidSplitterConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IngestError::InvalidSplitterConfig(format!(
                "overlap {chunk_overlap} must be smaller than chunk size {chunk_size}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1_000,
            chunk_overlap: 200,
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` into windows of at most `chunk_size` characters, with
/// `chunk_overlap` characters carried between consecutive windows.
///
/// Splitting is hierarchical: paragraph breaks first, then line breaks, then
/// word boundaries; the resulting pieces are re-merged greedily so windows
/// stay as full as possible. Deterministic for identical input.
pub fn split_text(text: &str, config: &SplitterConfig) -> Vec<String> {
    let pieces = split_recursive(text, &SEPARATORS, config.chunk_size);
    merge_pieces(pieces, config)
}

fn split_recursive(text: &str, separators: &[&str], max_chars: usize) -> Vec<String> {
    if char_len(text) <= max_chars {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    if let Some((separator, rest)) = separators.split_first() {
        let mut pieces = Vec::new();
        for part in text.split(separator) {
            pieces.extend(split_recursive(part, rest, max_chars));
        }
        return pieces;
    }

    // No separator left: hard cut at character boundaries.
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|window| window.iter().collect::<String>().trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

fn merge_pieces(pieces: Vec<String>, config: &SplitterConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<String> = VecDeque::new();

    for piece in pieces {
        let piece_len = char_len(&piece);

        if !window.is_empty() && window_len(&window) + 1 + piece_len > config.chunk_size {
            chunks.push(join_window(&window));

            // Shrink the window to the overlap budget, and further if the
            // incoming piece would not fit next to what remains.
            while !window.is_empty()
                && (window_len(&window) > config.chunk_overlap
                    || window_len(&window) + 1 + piece_len > config.chunk_size)
            {
                window.pop_front();
            }
        }

        window.push_back(piece);
    }

    if !window.is_empty() {
        chunks.push(join_window(&window));
    }

    chunks
}

fn window_len(window: &VecDeque<String>) -> usize {
    let text: usize = window.iter().map(|piece| char_len(piece)).sum();
    text + window.len().saturating_sub(1)
}

fn join_window(window: &VecDeque<String>) -> String {
    window
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split one page document, assigning chunk indexes starting at
/// `global_index`. Returns the chunks and the next free index.
pub fn build_chunks(
    document: &PageDocument,
    config: &SplitterConfig,
    global_index: u64,
) -> (Vec<Chunk>, u64) {
    let mut chunks = Vec::new();
    let mut cursor = global_index;

    for text in split_text(&document.text, config) {
        let chunk_id = make_chunk_id(
            &document.metadata.document_id,
            document.metadata.page,
            cursor,
            &text,
        );

        chunks.push(Chunk {
            chunk_id,
            chunk_index: cursor,
            text,
            metadata: document.metadata.clone(),
        });

        cursor = cursor.saturating_add(1);
    }

    (chunks, cursor)
}

/// Split all documents in order, numbering chunks with one global cursor.
pub fn split_documents(documents: &[PageDocument], config: &SplitterConfig) -> Vec<Chunk> {
    let mut all_chunks = Vec::new();
    let mut cursor = 0u64;

    for document in documents {
        let (chunks, next_cursor) = build_chunks(document, config, cursor);
        cursor = next_cursor;
        all_chunks.extend(chunks);
    }

    all_chunks
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
