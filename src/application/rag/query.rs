use super::RagError;
use super::index::VectorIndex;
use crate::client::ChatClient;
use crate::config::prompts::QA_TEMPLATE;
use crate::domain::document::SearchHit;
use crate::model::{EmbeddingProvider, ModelProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Answers natural-language questions from the indexed documentation.
pub struct QueryEngine<P: ModelProvider> {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    client: Arc<ChatClient<P>>,
    top_k: usize,
}

impl<P: ModelProvider> QueryEngine<P> {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        client: Arc<ChatClient<P>>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            client,
            top_k,
        }
    }

    /// Retrieves the closest chunks and asks the model to answer from them.
    /// Embedding and model failures are returned to the caller untouched.
    pub async fn query(&self, question: &str) -> Result<String, RagError> {
        let hits = if self.index.is_empty() {
            Vec::new()
        } else {
            let mut embeddings = self.embedder.embed(&[question.to_string()]).await?;
            let embedding = embeddings.pop().ok_or(RagError::EmbeddingCount {
                expected: 1,
                received: 0,
            })?;
            self.index.search(&embedding, self.top_k)
        };
        debug!(
            hits = hits.len(),
            sources = ?hits.iter().map(|hit| hit.chunk.id.as_str()).collect::<Vec<_>>(),
            "Retrieved context for documentation query"
        );

        let prompt = render_prompt(question, &hits);
        let answer = self.client.complete(prompt).await?;
        info!(
            model = self.client.model(),
            answer_len = answer.len(),
            "Documentation query answered"
        );
        Ok(answer)
    }
}

fn render_prompt(question: &str, hits: &[SearchHit]) -> String {
    let context = hits
        .iter()
        .map(|hit| {
            format!(
                "file_path: {}\n\n{}",
                hit.chunk.source_path.display(),
                hit.chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    QA_TEMPLATE
        .replace("{context}", &context)
        .replace("{query}", question)
}
