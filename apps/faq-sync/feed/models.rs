use crate::types::{FaqRecord, RichText};
use serde::{Deserialize, Deserializer};

/// JSON:API document returned by the Drupal FAQ endpoint
#[derive(Debug, Deserialize)]
pub struct FaqFeedResponse {
    pub data: Vec<FaqNode>,
}

#[derive(Debug, Deserialize)]
pub struct FaqNode {
    pub attributes: FaqAttributes,
}

#[derive(Debug, Deserialize)]
pub struct FaqAttributes {
    #[serde(deserialize_with = "deserialize_topic_id")]
    pub field_idtopic: String,
    pub field_question: String,
    #[serde(default)]
    pub field_questiontype: Option<String>,
    pub field_rich_text_answer: RichText,
}

impl From<FaqNode> for FaqRecord {
    fn from(node: FaqNode) -> Self {
        let attributes = node.attributes;
        FaqRecord {
            topic_id: attributes.field_idtopic,
            question_type: attributes.field_questiontype.unwrap_or_default(),
            question_text: attributes.field_question,
            answer: attributes.field_rich_text_answer,
        }
    }
}

/// Topic ids show up both as strings and as bare numbers depending on the
/// field configuration; both are normalized to their string form.
fn deserialize_topic_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TopicId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TopicId::deserialize(deserializer)? {
        TopicId::Text(text) => text,
        TopicId::Number(number) => number.to_string(),
    })
}
