//! Document store holding one embedding record per FAQ topic.

mod postgres;

pub use postgres::PgDocumentStore;

use crate::types::{EmbeddingRecord, EmbeddingUpsert, SimilarFaq};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every stored record, vectors included.
    async fn list_all(&self) -> Result<Vec<EmbeddingRecord>>;

    /// Removes the record with the given storage key. Deleting a key that is
    /// already gone is not an error.
    async fn delete_by_key(&self, key: Uuid) -> Result<()>;

    /// Inserts the record for `topic_id`, or replaces every field of the
    /// existing one. Returns the storage key.
    async fn upsert_by_topic_id(&self, input: EmbeddingUpsert) -> Result<Uuid>;

    /// Approximate nearest-neighbour search, most similar first.
    async fn vector_search(
        &self,
        embedding: &[f32],
        num_candidates: u32,
        limit: u32,
    ) -> Result<Vec<SimilarFaq>>;
}
