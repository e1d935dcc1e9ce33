use super::DocumentStore;
use crate::types::{EmbeddingRecord, EmbeddingUpsert, RichText, SimilarFaq};
use anyhow::{Context, Result};
use async_trait::async_trait;
use faq_db::models::{EmbeddingRow, IdRow, SimilarityRow};
use faq_db::schema::EMBEDDING_TABLE;
use faq_db::vector::{format_embedding, parse_embedding};
use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection, FromQueryResult, Statement,
    TransactionTrait,
};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Embedding store on Postgres + pgvector.
///
/// Holds a clone of the process-wide pool; closing the pool is left to
/// whoever created it.
#[derive(Clone)]
pub struct PgDocumentStore {
    db: DatabaseConnection,
}

impl PgDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn list_sql() -> String {
    format!(
        "SELECT id, topic_id, question, answer, embedding::text AS embedding FROM {EMBEDDING_TABLE}"
    )
}

fn upsert_sql(embedding: &[f32]) -> String {
    format!(
        r#"
        INSERT INTO {EMBEDDING_TABLE} (
            id, topic_id, question, answer, embedding, created_at, updated_at
        )
        VALUES (
            gen_random_uuid(), $1, $2, $3, '{}'::vector, now(), now()
        )
        ON CONFLICT (topic_id)
        DO UPDATE SET
            question = EXCLUDED.question,
            answer = EXCLUDED.answer,
            embedding = EXCLUDED.embedding,
            updated_at = EXCLUDED.updated_at
        RETURNING id
        "#,
        format_embedding(embedding)
    )
}

/// `hnsw.ef_search` is the size of the candidate list the index walks, which
/// is what a caller means by the number of candidates.
fn candidate_pool_sql(num_candidates: u32) -> String {
    format!("SET LOCAL hnsw.ef_search = {num_candidates}")
}

fn search_sql(embedding: &[f32]) -> String {
    format!(
        r#"
        SELECT question, answer
        FROM {EMBEDDING_TABLE}
        ORDER BY embedding <=> '{}'::vector
        LIMIT $1
        "#,
        format_embedding(embedding)
    )
}

fn record_from_row(row: EmbeddingRow) -> Result<EmbeddingRecord> {
    let answer: RichText = serde_json::from_value(row.answer)
        .with_context(|| format!("Stored answer for topic {} is not rich text", row.topic_id))?;
    let embedding = parse_embedding(&row.embedding)
        .with_context(|| format!("Stored embedding for topic {} is malformed", row.topic_id))?;

    Ok(EmbeddingRecord {
        key: row.id,
        topic_id: row.topic_id,
        question: row.question,
        answer,
        embedding,
    })
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<EmbeddingRecord>> {
        let stmt = Statement::from_string(DatabaseBackend::Postgres, list_sql());

        let rows = EmbeddingRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .context("Failed to list embeddings")?;

        debug!(count = rows.len(), "Loaded stored embeddings");
        rows.into_iter().map(record_from_row).collect()
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn delete_by_key(&self, key: Uuid) -> Result<()> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            format!("DELETE FROM {EMBEDDING_TABLE} WHERE id = $1"),
            vec![key.into()],
        );

        let result = self
            .db
            .execute(stmt)
            .await
            .with_context(|| format!("Failed to delete embedding {key}"))?;

        debug!(rows_affected = result.rows_affected(), "Deleted embedding");
        Ok(())
    }

    #[instrument(skip(self, input), fields(topic_id = %input.topic_id))]
    async fn upsert_by_topic_id(&self, input: EmbeddingUpsert) -> Result<Uuid> {
        let answer = serde_json::to_value(&input.answer).context("Failed to encode answer")?;

        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            upsert_sql(&input.embedding),
            vec![
                input.topic_id.clone().into(),
                input.question.into(),
                answer.into(),
            ],
        );

        let result = IdRow::find_by_statement(stmt)
            .one(&self.db)
            .await
            .with_context(|| format!("Failed to upsert embedding for topic {}", input.topic_id))?
            .context("No ID returned from upsert")?;

        Ok(result.id)
    }

    #[instrument(skip(self, embedding))]
    async fn vector_search(
        &self,
        embedding: &[f32],
        num_candidates: u32,
        limit: u32,
    ) -> Result<Vec<SimilarFaq>> {
        let txn = self
            .db
            .begin()
            .await
            .context("Failed to begin search transaction")?;

        txn.execute(Statement::from_string(
            DatabaseBackend::Postgres,
            candidate_pool_sql(num_candidates),
        ))
        .await
        .context("Failed to set candidate pool size")?;

        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            search_sql(embedding),
            vec![i64::from(limit).into()],
        );

        let rows = SimilarityRow::find_by_statement(stmt)
            .all(&txn)
            .await
            .context("Failed to find similar embeddings")?;

        txn.commit()
            .await
            .context("Failed to finish search transaction")?;

        rows.into_iter()
            .map(|row| {
                let answer = serde_json::from_value(row.answer)
                    .context("Stored answer is not rich text")?;
                Ok(SimilarFaq {
                    question: row.question,
                    answer,
                })
            })
            .collect()
    }
}
