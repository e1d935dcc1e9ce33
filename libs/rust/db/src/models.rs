use sea_orm::FromQueryResult;
use uuid::Uuid;

/// Full row of the embedding table. The vector is selected as text
/// (`embedding::text`) and decoded with [`crate::vector::parse_embedding`].
#[derive(Debug, Clone, FromQueryResult)]
pub struct EmbeddingRow {
    pub id: Uuid,
    pub topic_id: String,
    pub question: String,
    pub answer: serde_json::Value,
    pub embedding: String,
}

/// Projection returned by vector search.
#[derive(Debug, Clone, FromQueryResult)]
pub struct SimilarityRow {
    pub question: String,
    pub answer: serde_json::Value,
}

#[derive(Debug, FromQueryResult)]
pub struct IdRow {
    pub id: Uuid,
}
