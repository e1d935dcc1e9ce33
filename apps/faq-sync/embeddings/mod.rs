//! Embedding provider and the text that gets embedded for each FAQ.

mod openai;

pub use openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, EMBEDDING_DIMENSION, OpenAiEmbedder};

use anyhow::Result;
use async_trait::async_trait;

/// Turns a string into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Formats a question type such as `general_info` as `General Info`.
/// Empty segments are dropped; only the first character of each segment is
/// upper-cased, the rest is kept as written.
pub fn format_question_type(question_type: &str) -> String {
    question_type
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text embedded for a FAQ entry: the formatted question type, the question
/// as written, and a trailing question mark.
pub fn embedding_input(question_type: &str, question_text: &str) -> String {
    let prefix = format_question_type(question_type);
    if prefix.is_empty() {
        format!("{question_text}?")
    } else {
        format!("{prefix} {question_text}?")
    }
}
