pub mod chunking;
pub mod index;
pub mod query;

pub use chunking::TextSplitter;
pub use index::VectorIndex;
pub use query::QueryEngine;

use crate::client::ClientError;
use crate::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("embedding request failed: {0}")]
    Embedding(#[from] ModelError),
    #[error("embedding service returned {received} vectors for {expected} inputs")]
    EmbeddingCount { expected: usize, received: usize },
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl RagError {
    pub fn user_message(&self) -> String {
        match self {
            RagError::Embedding(err) => err.user_message(),
            RagError::EmbeddingCount { .. } => self.to_string(),
            RagError::Client(err) => err.user_message(),
        }
    }
}
