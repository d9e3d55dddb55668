//! Recursive character chunking with overlap.
//!
//! Text is split on the coarsest separator that occurs (`"\n\n"`, `"\n"`,
//! `". "`, `" "`, then single characters). Pieces still longer than
//! `chunk_size` are split again with the next separator. Adjacent pieces are
//! then merged back up to `chunk_size`, carrying up to `chunk_overlap` bytes
//! of trailing context into the next chunk.

use std::collections::VecDeque;

/// Default chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// A chunk with its byte span in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    pub chunk_index: usize,
    pub start_char: usize,
    pub end_char: usize,
}

/// Recursive chunker that respects document structure.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl RecursiveChunker {
    /// `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let pieces = self.split_text(text, SEPARATORS);
        let mut result = Vec::with_capacity(pieces.len());
        let mut search_from = 0usize;

        for piece in pieces {
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                continue;
            }
            // Every piece is a contiguous slice of `text`; overlap means the next
            // one may begin before the previous one ended.
            let start = text[search_from..]
                .find(trimmed)
                .map(|i| i + search_from)
                .or_else(|| text.find(trimmed))
                .unwrap_or(search_from);
            search_from = next_boundary(text, start);

            result.push(TextChunk {
                text: trimmed.to_string(),
                chunk_index: result.len(),
                start_char: start,
                end_char: start + trimmed.len(),
            });
        }
        result
    }

    fn split_text<'a>(&self, text: &'a str, separators: &[&'a str]) -> Vec<&'a str> {
        // First separator that actually occurs; "" always does.
        let (pos, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len(), ""));
        let remaining = separators.get(pos + 1..).unwrap_or(&[]);

        let splits: Vec<&'a str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            split_keeping_spans(text, separator)
        };

        let mut chunks = Vec::new();
        let mut small: Vec<&'a str> = Vec::new();

        for split in splits {
            if split.len() <= self.chunk_size {
                small.push(split);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge_splits(text, &small, separator));
                small.clear();
            }
            if remaining.is_empty() {
                chunks.push(split);
            } else {
                chunks.extend(self.split_text(split, remaining));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge_splits(text, &small, separator));
        }
        chunks
    }

    /// Join consecutive splits into slices of at most `chunk_size` bytes.
    fn merge_splits<'a>(&self, text: &'a str, splits: &[&'a str], separator: &str) -> Vec<&'a str> {
        let sep_len = separator.len();
        let mut out = Vec::new();
        let mut window: VecDeque<&'a str> = VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            let extra = if window.is_empty() { 0 } else { sep_len };
            if total + split.len() + extra > self.chunk_size && !window.is_empty() {
                out.push(span(text, &window));
                // Keep a tail of at most `chunk_overlap` bytes that still leaves room.
                while !window.is_empty()
                    && (total > self.chunk_overlap
                        || total + split.len() + sep_len > self.chunk_size)
                {
                    let removed = window.pop_front().map(str::len).unwrap_or(0);
                    total -= removed + if window.is_empty() { 0 } else { sep_len };
                }
            }
            total += split.len() + if window.is_empty() { 0 } else { sep_len };
            window.push_back(split);
        }
        if !window.is_empty() {
            out.push(span(text, &window));
        }
        out
    }
}

/// Split on `separator`, returning slices of `text` (not copies).
fn split_keeping_spans<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices(separator) {
        out.push(&text[start..i]);
        start = i + separator.len();
    }
    out.push(&text[start..]);
    out
}

/// The slice of `text` covering the first through last element of `window`.
fn span<'a>(text: &'a str, window: &VecDeque<&'a str>) -> &'a str {
    let base = text.as_ptr() as usize;
    let first = window.front().map(|s| s.as_ptr() as usize - base).unwrap_or(0);
    let last = window
        .back()
        .map(|s| s.as_ptr() as usize - base + s.len())
        .unwrap_or(first);
    &text[first..last]
}

fn next_boundary(text: &str, from: usize) -> usize {
    let mut i = (from + 1).min(text.len());
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}
