use super::RagError;
use super::chunking::TextSplitter;
use crate::domain::document::{Chunk, Document, SearchHit};
use crate::model::EmbeddingProvider;
use std::cmp::Ordering;
use tracing::{debug, info};

const EMBED_BATCH_SIZE: usize = 64;

/// In-memory vector index over document chunks. Built once per process and
/// read-only afterwards.
#[derive(Debug, Default)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    /// Chunks every document and embeds the chunks in batches.
    pub async fn build(
        documents: &[Document],
        splitter: &TextSplitter,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self, RagError> {
        let mut chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|document| splitter.split(document))
            .collect();
        debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Split documents into chunks"
        );

        for batch in chunks.chunks_mut(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let embeddings = embedder.embed(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(RagError::EmbeddingCount {
                    expected: batch.len(),
                    received: embeddings.len(),
                });
            }
            for (chunk, embedding) in batch.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
        }

        info!(chunks = chunks.len(), "Vector index built");
        Ok(Self { chunks })
    }

    /// Wraps chunks that already carry embeddings.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the `top_k` most similar chunks, best first. Equal scores keep
    /// insertion order.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .chunks
            .iter()
            .map(|chunk| SearchHit {
                score: cosine_similarity(&chunk.embedding, embedding),
                chunk: chunk.clone(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);
        hits
    }
}

/// Returns 0.0 when either vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
