use anyhow::{Context, Result};

/// Format embedding vector as a pgvector literal
pub fn format_embedding(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

/// Parse the text form of a pgvector value back into floats
pub fn parse_embedding(text: &str) -> Result<Vec<f32>> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .with_context(|| format!("Malformed vector literal: {text}"))?;

    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|value| {
            value
                .trim()
                .parse::<f32>()
                .with_context(|| format!("Invalid vector component: {value}"))
        })
        .collect()
}
