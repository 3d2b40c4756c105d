//! In-process collaborators for exercising the service and HTTP layers.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::database::{FaqRecord, QueryOptions, VectorIndex, VectorMatch};
use crate::embeddings::Embedder;
use crate::{FaqError, Result};

const DIMENSIONS: usize = 64;

/// Deterministic bag-of-words embedder that counts its invocations
#[derive(Default)]
pub(crate) struct FakeEmbedder {
    calls: AtomicUsize,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl FakeEmbedder {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn hanging(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn word_bucket(word: &str) -> usize {
    // FNV-1a
    let hash = word.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    });
    (hash % DIMENSIONS as u64) as usize
}

pub(crate) fn embed_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSIONS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        vector[word_bucket(&word.to_lowercase())] += 1.0;
    }
    vector
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(FaqError::Embedding(format!(
                "Failed to generate embedding: {message}"
            )));
        }

        Ok(embed_words(text))
    }

    async fn check_health(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(FaqError::Embedding(message.clone())),
            None => Ok(()),
        }
    }
}

/// Brute-force cosine index kept in memory
#[derive(Default)]
pub(crate) struct MemoryIndex {
    records: Mutex<Vec<FaqRecord>>,
    upserts: AtomicUsize,
    queries: AtomicUsize,
    upsert_failure: Option<String>,
    query_failure: Option<String>,
}

impl MemoryIndex {
    pub(crate) fn failing_upsert(message: &str) -> Self {
        Self {
            upsert_failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn failing_query(message: &str) -> Self {
        Self {
            query_failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub(crate) fn records(&self) -> Vec<FaqRecord> {
        self.records.lock().expect("index lock poisoned").clone()
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
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, records: Vec<FaqRecord>) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.upsert_failure {
            return Err(FaqError::Storage(message.clone()));
        }

        let mut stored = self.records.lock().expect("index lock poisoned");
        for record in records {
            stored.retain(|existing| existing.id != record.id);
            stored.push(record);
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], options: QueryOptions) -> Result<Vec<VectorMatch>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.query_failure {
            return Err(FaqError::Storage(message.clone()));
        }

        let stored = self.records.lock().expect("index lock poisoned");
        let mut matches: Vec<VectorMatch> = stored
            .iter()
            .map(|record| VectorMatch {
                id: record.id.clone(),
                score: cosine(vector, &record.values),
                values: record.values.clone(),
                metadata: if options.return_metadata {
                    record.metadata.clone()
                } else {
                    None
                },
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(options.top_k);
        Ok(matches)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.lock().expect("index lock poisoned").len() as u64)
    }
}
