use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use tracing::{info, instrument};

/// Table holding one row per FAQ topic.
pub const EMBEDDING_TABLE: &str = "public.faq_embedding";

/// Name of the HNSW index used for vector search.
pub const VECTOR_INDEX: &str = "vector_search";

fn bootstrap_statements(dimensions: usize) -> Vec<String> {
    vec![
        "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {EMBEDDING_TABLE} (
                id uuid PRIMARY KEY DEFAULT gen_random_uuid(),
                topic_id text NOT NULL UNIQUE,
                question text NOT NULL,
                answer jsonb NOT NULL,
                embedding vector({dimensions}) NOT NULL,
                created_at timestamp NOT NULL DEFAULT now(),
                updated_at timestamp NOT NULL DEFAULT now()
            )
            "#
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {VECTOR_INDEX} ON {EMBEDDING_TABLE} \
             USING hnsw (embedding vector_cosine_ops)"
        ),
    ]
}

/// Creates the pgvector extension, the embedding table and its index when
/// they are missing. Existing objects are left untouched, so a dimension
/// change needs a manual migration.
#[instrument(skip(db))]
pub async fn ensure_schema(db: &DatabaseConnection, dimensions: usize) -> Result<()> {
    for sql in bootstrap_statements(dimensions) {
        db.execute(Statement::from_string(DatabaseBackend::Postgres, sql))
            .await
            .context("Failed to bootstrap embedding schema")?;
    }

    info!(table = EMBEDDING_TABLE, dimensions, "Embedding schema ready");
    Ok(())
}
