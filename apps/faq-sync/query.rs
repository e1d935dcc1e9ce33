use crate::embeddings::Embedder;
use crate::errors::SyncError;
use crate::store::DocumentStore;
use crate::types::SimilarFaq;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Answers free-text questions with the closest stored FAQs.
pub struct QueryService {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
}

impl QueryService {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DocumentStore>) -> Self {
        Self { embedder, store }
    }

    /// Embeds `question` as-is and returns at most `limit` FAQs, most similar
    /// first, drawn from a pool of `num_candidates` index candidates. Both
    /// knobs are forwarded to the index untouched.
    #[instrument(skip(self, question), fields(chars = question.len()))]
    pub async fn find_similar(
        &self,
        question: &str,
        num_candidates: u32,
        limit: u32,
    ) -> Result<Vec<SimilarFaq>, SyncError> {
        let embedding = self.embedder.embed(question).await.map_err(|e| {
            error!(error = %e, "Failed to embed question");
            SyncError::embedding_failure(e)
        })?;

        let matches = self
            .store
            .vector_search(&embedding, num_candidates, limit)
            .await
            .map_err(|e| {
                error!(error = %e, "Vector search failed");
                SyncError::search_failure(e)
            })?;

        info!(matches = matches.len(), "Similar FAQs retrieved");
        Ok(matches)
    }
}
