//! Documents loaded from the input corpus and the pieces the index keeps of them.

use std::path::PathBuf;

/// Raw text of one input file. Immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the data directory, used as a stable identifier.
    pub id: String,
    pub text: String,
    pub source_path: PathBuf,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, source_path: PathBuf) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source_path,
        }
    }
}

/// A segment of a [`Document`] together with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// `{document_id}#{index}`
    pub id: String,
    pub document_id: String,
    pub source_path: PathBuf,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A retrieved [`Chunk`] paired with its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}
