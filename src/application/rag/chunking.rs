//! Splits documents into overlapping, size-bounded pieces for embedding.
//!
//! Sizes are counted in characters, never bytes, so multi-byte text is never
//! cut inside a code point.

use crate::domain::document::{Chunk, Document};

const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
        }
    }

    /// Chunks carry their parent's id and path; embeddings are left empty.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                id: format!("{}#{index}", document.id),
                document_id: document.id.clone(),
                source_path: document.source_path.clone(),
                text,
                embedding: Vec::new(),
            })
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        split_recursive(text, self.chunk_size, self.chunk_overlap, &SEPARATORS)
    }
}

fn split_recursive(text: &str, size: usize, overlap: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= size {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }
    let Some((separator, rest)) = separators.split_first() else {
        return split_by_chars(text, size, overlap);
    };
    if !text.contains(separator) {
        return split_recursive(text, size, overlap, rest);
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for segment in split_keeping_separator(text, separator) {
        let segment_len = char_len(segment);
        if segment_len > size {
            flush(&mut chunks, &mut current);
            chunks.extend(split_recursive(segment, size, overlap, rest));
            continue;
        }
        if char_len(&current) + segment_len <= size {
            current.push_str(segment);
            continue;
        }
        let tail = tail_chars(&current, overlap).to_string();
        flush(&mut chunks, &mut current);
        if char_len(&tail) + segment_len <= size {
            current.push_str(&tail);
        }
        current.push_str(segment);
    }
    flush(&mut chunks, &mut current);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
}

fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        pieces.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn split_by_chars(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn tail_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }
    let total = char_len(text);
    if total <= count {
        return text;
    }
    let skip = total - count;
    let offset = text
        .char_indices()
        .nth(skip)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    &text[offset..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = TextSplitter::new(100, 10);
        assert_eq!(splitter.split_text("  hello world  "), vec!["hello world"]);
        assert!(splitter.split_text("   \n ").is_empty());
    }

    #[test]
    fn chunks_respect_size_limit() {
        let text = "First paragraph about parsing.\n\nSecond paragraph about tokens. \
                    It has two sentences.\n\nThird paragraph is here.";
        let splitter = TextSplitter::new(40, 5);
        let chunks = splitter.split_text(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40, "chunk too long: {chunk:?}");
        }
        assert!(chunks[0].starts_with("First paragraph"));
    }

    #[test]
    fn unbroken_text_falls_back_to_character_windows() {
        let text = "x".repeat(25);
        let splitter = TextSplitter::new(10, 2);
        let chunks = splitter.split_text(&text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|chunk| chunk.len() <= 10));
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "日本語のテキストです".repeat(5);
        let splitter = TextSplitter::new(7, 2);
        let chunks = splitter.split_text(&text);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 7));
    }

    #[test]
    fn chunk_ids_follow_document_id() {
        let document = Document::new(
            "guide.md",
            "alpha beta gamma delta",
            PathBuf::from("data/guide.md"),
        );
        let chunks = TextSplitter::new(11, 0).split(&document);
        assert_eq!(chunks[0].id, "guide.md#0");
        assert_eq!(chunks[1].id, "guide.md#1");
        assert!(chunks.iter().all(|chunk| chunk.document_id == "guide.md"));
        assert!(chunks.iter().all(|chunk| chunk.embedding.is_empty()));
    }
}
