#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use faq_sync::embeddings::Embedder;
use faq_sync::feed::FaqSource;
use faq_sync::store::DocumentStore;
use faq_sync::types::{EmbeddingRecord, EmbeddingUpsert, FaqRecord, RichText, SimilarFaq};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

pub const DIMENSIONS: usize = 256;

pub fn faq(topic_id: &str, question_type: &str, question: &str, answer: &str) -> FaqRecord {
    FaqRecord {
        topic_id: topic_id.to_string(),
        question_type: question_type.to_string(),
        question_text: question.to_string(),
        answer: RichText::new(answer, "plain"),
    }
}

/// Feed whose contents can be swapped between runs.
#[derive(Default)]
pub struct StaticFeed {
    faqs: Mutex<Vec<FaqRecord>>,
    fail: AtomicBool,
}

impl StaticFeed {
    pub fn new(faqs: Vec<FaqRecord>) -> Self {
        Self {
            faqs: Mutex::new(faqs),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set(&self, faqs: Vec<FaqRecord>) {
        *self.faqs.lock().unwrap() = faqs;
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FaqSource for StaticFeed {
    async fn fetch_faqs(&self) -> Result<Vec<FaqRecord>> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("FAQ feed error: status=503 Service Unavailable, body=");
        }
        Ok(self.faqs.lock().unwrap().clone())
    }
}

/// Deterministic embedder that remembers every input it was asked for.
#[derive(Default)]
pub struct RecordingEmbedder {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every input containing `needle` fail.
    pub fn fail_on(&self, needle: &str) {
        self.failing.lock().unwrap().insert(needle.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

/// Bag-of-bytes vector: similar strings land close together.
pub fn vector_for(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSIONS];
    for word in text.to_lowercase().split_whitespace() {
        let bucket = word.bytes().fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        vector[bucket % DIMENSIONS] += 1.0;
    }
    vector
}

#[async_trait]
impl Embedder for RecordingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());
        if self
            .failing
            .lock()
            .unwrap()
            .iter()
            .any(|needle| text.contains(needle.as_str()))
        {
            bail!("Embedding request failed (500 Internal Server Error): upstream");
        }
        Ok(vector_for(text))
    }
}

/// In-memory document store with brute-force cosine search.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<EmbeddingRecord>>,
    failing_deletes: Mutex<HashSet<Uuid>>,
    fail_list: AtomicBool,
    fail_search: AtomicBool,
    mutations: AtomicUsize,
    touched: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record directly, bypassing the mutation counter.
    pub fn seed(&self, topic_id: &str, question: &str, answer: RichText) -> Uuid {
        let key = Uuid::new_v4();
        self.records.lock().unwrap().push(EmbeddingRecord {
            key,
            topic_id: topic_id.to_string(),
            question: question.to_string(),
            answer,
            embedding: vector_for(question),
        });
        key
    }

    pub fn fail_delete(&self, key: Uuid) {
        self.failing_deletes.lock().unwrap().insert(key);
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_search(&self, fail: bool) {
        self.fail_search.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<EmbeddingRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn by_topic(&self) -> HashMap<String, EmbeddingRecord> {
        self.records()
            .into_iter()
            .map(|record| (record.topic_id.clone(), record))
            .collect()
    }

    /// Successful deletes and upserts since creation.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Every call made against the store, successful or not.
    pub fn touched(&self) -> usize {
        self.touched.load(Ordering::SeqCst)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<EmbeddingRecord>> {
        self.touched.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            bail!("Failed to list embeddings: connection reset");
        }
        Ok(self.records())
    }

    async fn delete_by_key(&self, key: Uuid) -> Result<()> {
        self.touched.fetch_add(1, Ordering::SeqCst);
        if self.failing_deletes.lock().unwrap().contains(&key) {
            return Err(anyhow!("Failed to delete embedding {key}"));
        }
        self.records.lock().unwrap().retain(|record| record.key != key);
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_by_topic_id(&self, input: EmbeddingUpsert) -> Result<Uuid> {
        self.touched.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let key = match records.iter_mut().find(|r| r.topic_id == input.topic_id) {
            Some(existing) => {
                existing.question = input.question;
                existing.answer = input.answer;
                existing.embedding = input.embedding;
                existing.key
            }
            None => {
                let key = Uuid::new_v4();
                records.push(EmbeddingRecord {
                    key,
                    topic_id: input.topic_id,
                    question: input.question,
                    answer: input.answer,
                    embedding: input.embedding,
                });
                key
            }
        };
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(key)
    }

    async fn vector_search(
        &self,
        embedding: &[f32],
        num_candidates: u32,
        limit: u32,
    ) -> Result<Vec<SimilarFaq>> {
        self.touched.fetch_add(1, Ordering::SeqCst);
        if self.fail_search.load(Ordering::SeqCst) {
            bail!("Failed to find similar embeddings");
        }
        let mut scored: Vec<(f32, EmbeddingRecord)> = self
            .records()
            .into_iter()
            .map(|record| (cosine(embedding, &record.embedding), record))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(num_candidates as usize);
        scored.truncate(limit as usize);

        Ok(scored
            .into_iter()
            .map(|(_, record)| SimilarFaq {
                question: record.question,
                answer: record.answer,
            })
            .collect())
    }
}
