use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rich-text answer as published by the feed.
///
/// Sub-fields other than `value` and `format` (Drupal adds `processed`, for
/// instance) are kept in `extra`, so two answers compare equal only when every
/// sub-field matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RichText {
    pub fn new(value: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: Some(format.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// One FAQ entry from the authoritative source.
#[derive(Debug, Clone, PartialEq)]
pub struct FaqRecord {
    pub topic_id: String,
    pub question_type: String,
    pub question_text: String,
    pub answer: RichText,
}

/// A stored embedding together with the snapshot it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRecord {
    pub key: Uuid,
    pub topic_id: String,
    pub question: String,
    pub answer: RichText,
    pub embedding: Vec<f32>,
}

impl EmbeddingRecord {
    /// True when the stored snapshot still matches the FAQ entry.
    pub fn matches(&self, faq: &FaqRecord) -> bool {
        self.answer == faq.answer && self.question == faq.question_text
    }
}

/// Input for creating or fully replacing the record of a topic
#[derive(Debug, Clone)]
pub struct EmbeddingUpsert {
    pub topic_id: String,
    pub question: String,
    pub answer: RichText,
    pub embedding: Vec<f32>,
}

/// Search hit returned to callers. Never carries the vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarFaq {
    pub question: String,
    pub answer: RichText,
}
