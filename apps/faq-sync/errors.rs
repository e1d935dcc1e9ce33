use thiserror::Error;

/// Failures surfaced by reconciliation and search.
///
/// Leaf clients report `anyhow` errors; they are folded into one of these
/// variants at the step where they occur, keeping the full context chain in
/// the message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("FAQ source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    #[error("vector search failed: {0}")]
    SearchFailure(String),

    #[error("failed to delete {} stale record(s): {}", .keys.len(), .keys.join(", "))]
    PartialDeletionFailure { keys: Vec<String> },

    #[error("failed to upsert {} topic(s): {}", .topic_ids.len(), .topic_ids.join(", "))]
    PartialUpsertFailure { topic_ids: Vec<String> },
}

impl SyncError {
    pub fn source_unavailable(err: anyhow::Error) -> Self {
        Self::SourceUnavailable(format!("{err:#}"))
    }

    pub fn store_unavailable(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(format!("{err:#}"))
    }

    pub fn embedding_failure(err: anyhow::Error) -> Self {
        Self::EmbeddingFailure(format!("{err:#}"))
    }

    pub fn search_failure(err: anyhow::Error) -> Self {
        Self::SearchFailure(format!("{err:#}"))
    }
}
