use crate::embeddings::{Embedder, embedding_input};
use crate::errors::SyncError;
use crate::feed::FaqSource;
use crate::store::DocumentStore;
use crate::types::{EmbeddingRecord, EmbeddingUpsert, FaqRecord};
use futures::{StreamExt, stream};
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Default number of FAQ entries embedded at the same time
pub const DEFAULT_CONCURRENCY: usize = 4;

/// A record the reconciler could not delete or refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFailure {
    pub topic_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Uuid>,
    #[serde(serialize_with = "serialize_display")]
    pub error: SyncError,
}

fn serialize_display<S: Serializer>(error: &SyncError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub fetched_faqs: usize,
    pub existing_records: usize,
    /// Topic ids whose records were removed.
    pub deleted: Vec<String>,
    /// Topic ids that were embedded and written.
    pub upserted: Vec<String>,
    pub unchanged: usize,
    /// Topic ids seen more than once in the feed.
    pub duplicate_topic_ids: Vec<String>,
    pub deletion_failures: Vec<RecordFailure>,
    pub upsert_failures: Vec<RecordFailure>,
}

impl ReconcileReport {
    /// Number of store writes performed.
    pub fn mutations(&self) -> usize {
        self.deleted.len() + self.upserted.len()
    }

    pub fn is_clean(&self) -> bool {
        self.deletion_failures.is_empty() && self.upsert_failures.is_empty()
    }

    /// Folds the per-record failures into a single error. Deletion failures
    /// take precedence; the report itself keeps both lists.
    pub fn outcome(&self) -> Result<(), SyncError> {
        if !self.deletion_failures.is_empty() {
            return Err(SyncError::PartialDeletionFailure {
                keys: self
                    .deletion_failures
                    .iter()
                    .map(|failure| match failure.key {
                        Some(key) => key.to_string(),
                        None => failure.topic_id.clone(),
                    })
                    .collect(),
            });
        }

        if !self.upsert_failures.is_empty() {
            return Err(SyncError::PartialUpsertFailure {
                topic_ids: self
                    .upsert_failures
                    .iter()
                    .map(|failure| failure.topic_id.clone())
                    .collect(),
            });
        }

        Ok(())
    }
}

/// Brings the document store in line with the FAQ source.
pub struct Reconciler {
    source: Arc<dyn FaqSource>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    concurrency: usize,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn FaqSource>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            source,
            embedder,
            store,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Upper bound on embedding calls in flight during the upsert pass.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Runs one full pass: fetch both sides, delete stale records, then embed
    /// and upsert every new or changed FAQ.
    ///
    /// Only the two initial reads abort the pass. Failures on individual
    /// records are logged and collected in the report.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileReport, SyncError> {
        info!("Starting reconciliation");

        let faqs = self.source.fetch_faqs().await.map_err(|e| {
            error!(error = %e, error_chain = ?e, "Failed to fetch FAQs, aborting reconciliation");
            SyncError::source_unavailable(e)
        })?;

        let existing = self.store.list_all().await.map_err(|e| {
            error!(error = %e, error_chain = ?e, "Failed to read stored embeddings, aborting reconciliation");
            SyncError::store_unavailable(e)
        })?;

        let mut report = ReconcileReport {
            fetched_faqs: faqs.len(),
            existing_records: existing.len(),
            ..Default::default()
        };

        let (current_faqs, faqs_by_topic) = index_faqs(&faqs, &mut report.duplicate_topic_ids);
        let records_by_topic = index_records(&existing);

        self.delete_stale(&existing, &faqs_by_topic, &records_by_topic, &mut report)
            .await;
        self.upsert_changed(&current_faqs, &records_by_topic, &mut report)
            .await;

        info!(
            fetched_faqs = report.fetched_faqs,
            existing_records = report.existing_records,
            deleted = report.deleted.len(),
            upserted = report.upserted.len(),
            unchanged = report.unchanged,
            deletion_failures = report.deletion_failures.len(),
            upsert_failures = report.upsert_failures.len(),
            "Reconciliation finished"
        );

        Ok(report)
    }

    async fn delete_stale(
        &self,
        existing: &[EmbeddingRecord],
        faqs_by_topic: &HashMap<&str, &FaqRecord>,
        records_by_topic: &HashMap<&str, &EmbeddingRecord>,
        report: &mut ReconcileReport,
    ) {
        for record in existing {
            let orphaned = !faqs_by_topic.contains_key(record.topic_id.as_str());
            let shadowed = records_by_topic
                .get(record.topic_id.as_str())
                .is_some_and(|winner| winner.key != record.key);

            if !orphaned && !shadowed {
                continue;
            }

            match self.store.delete_by_key(record.key).await {
                Ok(()) => {
                    debug!(topic_id = %record.topic_id, key = %record.key, shadowed, "Deleted stale embedding");
                    report.deleted.push(record.topic_id.clone());
                }
                Err(e) => {
                    error!(
                        topic_id = %record.topic_id,
                        key = %record.key,
                        error = %e,
                        "Failed to delete stale embedding, continuing..."
                    );
                    report.deletion_failures.push(RecordFailure {
                        topic_id: record.topic_id.clone(),
                        key: Some(record.key),
                        error: SyncError::store_unavailable(e),
                    });
                }
            }
        }
    }

    async fn upsert_changed(
        &self,
        current_faqs: &[&FaqRecord],
        records_by_topic: &HashMap<&str, &EmbeddingRecord>,
        report: &mut ReconcileReport,
    ) {
        let pending: Vec<&FaqRecord> = current_faqs
            .iter()
            .copied()
            .filter(|faq| {
                !records_by_topic
                    .get(faq.topic_id.as_str())
                    .is_some_and(|record| record.matches(faq))
            })
            .collect();
        report.unchanged = current_faqs.len() - pending.len();

        // Built up front so the stream does not hold a closure generic over
        // the item lifetime, which would make the whole pass non-`Send`.
        let refreshes: Vec<_> = pending
            .into_iter()
            .map(|faq| async move { (faq, self.refresh(faq).await) })
            .collect();

        let results: Vec<(&FaqRecord, Result<Uuid, SyncError>)> = stream::iter(refreshes)
            .buffered(self.concurrency)
            .collect()
            .await;

        for (faq, result) in results {
            match result {
                Ok(key) => {
                    debug!(topic_id = %faq.topic_id, key = %key, "Upserted embedding");
                    report.upserted.push(faq.topic_id.clone());
                }
                Err(e) => {
                    error!(topic_id = %faq.topic_id, error = %e, "Failed to refresh embedding, continuing...");
                    report.upsert_failures.push(RecordFailure {
                        topic_id: faq.topic_id.clone(),
                        key: None,
                        error: e,
                    });
                }
            }
        }
    }

    async fn refresh(&self, faq: &FaqRecord) -> Result<Uuid, SyncError> {
        let input = embedding_input(&faq.question_type, &faq.question_text);
        let embedding = self
            .embedder
            .embed(&input)
            .await
            .map_err(SyncError::embedding_failure)?;

        self.store
            .upsert_by_topic_id(EmbeddingUpsert {
                topic_id: faq.topic_id.clone(),
                question: faq.question_text.clone(),
                answer: faq.answer.clone(),
                embedding,
            })
            .await
            .map_err(SyncError::store_unavailable)
    }
}

/// Maps FAQs by topic id, last occurrence winning. Also returns the winners
/// in order of first appearance so passes stay deterministic.
fn index_faqs<'a>(
    faqs: &'a [FaqRecord],
    duplicates: &mut Vec<String>,
) -> (Vec<&'a FaqRecord>, HashMap<&'a str, &'a FaqRecord>) {
    let mut by_topic: HashMap<&str, &FaqRecord> = HashMap::with_capacity(faqs.len());
    for faq in faqs {
        if by_topic.insert(faq.topic_id.as_str(), faq).is_some() {
            warn!(topic_id = %faq.topic_id, "Duplicate topic id in FAQ feed, keeping the last one");
            duplicates.push(faq.topic_id.clone());
        }
    }

    let mut seen = HashSet::with_capacity(by_topic.len());
    let ordered = faqs
        .iter()
        .filter(|faq| seen.insert(faq.topic_id.as_str()))
        .map(|faq| by_topic[faq.topic_id.as_str()])
        .collect();

    (ordered, by_topic)
}

fn index_records(records: &[EmbeddingRecord]) -> HashMap<&str, &EmbeddingRecord> {
    records
        .iter()
        .map(|record| (record.topic_id.as_str(), record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RichText;

    fn faq(topic_id: &str, question: &str) -> FaqRecord {
        FaqRecord {
            topic_id: topic_id.to_string(),
            question_type: "general_info".to_string(),
            question_text: question.to_string(),
            answer: RichText::new("answer", "plain"),
        }
    }

    #[test]
    fn test_index_faqs_last_occurrence_wins() {
        let faqs = vec![faq("t1", "first"), faq("t2", "other"), faq("t1", "second")];
        let mut duplicates = Vec::new();

        let (ordered, by_topic) = index_faqs(&faqs, &mut duplicates);

        assert_eq!(duplicates, vec!["t1".to_string()]);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].topic_id, "t1");
        assert_eq!(ordered[0].question_text, "second");
        assert_eq!(ordered[1].topic_id, "t2");
        assert_eq!(by_topic["t1"].question_text, "second");
    }

    #[test]
    fn test_outcome_prefers_deletion_failures() {
        let key = Uuid::new_v4();
        let report = ReconcileReport {
            deletion_failures: vec![RecordFailure {
                topic_id: "t2".to_string(),
                key: Some(key),
                error: SyncError::StoreUnavailable("boom".to_string()),
            }],
            upsert_failures: vec![RecordFailure {
                topic_id: "t3".to_string(),
                key: None,
                error: SyncError::EmbeddingFailure("boom".to_string()),
            }],
            ..Default::default()
        };

        assert!(!report.is_clean());
        assert_eq!(
            report.outcome(),
            Err(SyncError::PartialDeletionFailure {
                keys: vec![key.to_string()]
            })
        );
    }

    #[test]
    fn test_outcome_reports_upsert_failures() {
        let report = ReconcileReport {
            upsert_failures: vec![RecordFailure {
                topic_id: "t3".to_string(),
                key: None,
                error: SyncError::EmbeddingFailure("boom".to_string()),
            }],
            ..Default::default()
        };

        assert_eq!(
            report.outcome(),
            Err(SyncError::PartialUpsertFailure {
                topic_ids: vec!["t3".to_string()]
            })
        );
        assert!(ReconcileReport::default().outcome().is_ok());
    }

    #[test]
    fn test_failure_serializes_error_message() {
        let failure = RecordFailure {
            topic_id: "t3".to_string(),
            key: None,
            error: SyncError::EmbeddingFailure("quota".to_string()),
        };
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"topic_id": "t3", "error": "embedding failed: quota"})
        );
    }
}
