//! FAQ insert and search.
//!
//! Both operations validate their input before touching any collaborator,
//! embed the text once, and make a single call to the vector index.


use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Config, settings::MAX_TOP_K};
use crate::database::{FaqMetadata, FaqRecord, QueryOptions, VectorIndex, VectorMatch};
use crate::embeddings::Embedder;
use crate::{FaqError, Result};

pub const NO_MATCHES_MESSAGE: &str = "No matching FAQs found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub id: String,
}

/// A stored FAQ projected for a search response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub id: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl From<VectorMatch> for SearchMatch {
    fn from(hit: VectorMatch) -> Self {
        let (question, answer) = hit
            .metadata
            .map_or((None, None), |metadata| (metadata.question, metadata.answer));

        Self {
            id: hit.id,
            score: hit.score,
            question,
            answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub matches: Vec<SearchMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Orchestrates the embedding provider and the vector index.
///
/// Holds no per-request state; collaborators are supplied by the caller.
#[derive(Clone)]
pub struct FaqService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    call_timeout: Duration,
    default_top_k: usize,
}

impl FaqService {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            call_timeout: Duration::from_secs(30),
            default_top_k: 1,
        }
    }

    #[inline]
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self::new(embedder, index)
            .with_timeout(config.request_timeout())
            .with_default_top_k(config.search.top_k)
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    #[inline]
    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k.clamp(1, MAX_TOP_K);
        self
    }

    #[inline]
    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    #[inline]
    pub fn index(&self) -> &dyn VectorIndex {
        self.index.as_ref()
    }

    /// Embed `question` and store it together with `answer` under a fresh id
    #[inline]
    pub async fn insert(&self, question: &str, answer: &str) -> Result<InsertOutcome> {
        if question.is_empty() {
            return Err(FaqError::Validation("question must not be empty".to_string()));
        }
        if answer.is_empty() {
            return Err(FaqError::Validation("answer must not be empty".to_string()));
        }

        let values = self
            .bounded("embedding", self.embedder.embed(question))
            .await?;

        let id = Uuid::new_v4().to_string();
        let record = FaqRecord {
            id: id.clone(),
            values,
            metadata: Some(FaqMetadata::new(question, answer)),
        };

        self.bounded("vector upsert", self.index.upsert(vec![record]))
            .await?;

        info!("Stored FAQ {}", id);
        Ok(InsertOutcome { id })
    }

    /// Find the stored FAQs closest to `query`.
    ///
    /// `top_k` overrides the configured default and is clamped to
    /// `1..=MAX_TOP_K`.
    #[inline]
    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<SearchOutcome> {
        if query.is_empty() {
            return Err(FaqError::Validation(
                "Query parameter \"q\" is required".to_string(),
            ));
        }

        let top_k = top_k.unwrap_or(self.default_top_k).clamp(1, MAX_TOP_K);
        debug!("Searching FAQs: query='{}', top_k={}", query, top_k);

        let vector = self
            .bounded("embedding", self.embedder.embed(query))
            .await?;

        let options = QueryOptions {
            top_k,
            return_metadata: true,
        };
        let hits = self
            .bounded("vector query", self.index.query(&vector, options))
            .await?;

        if hits.is_empty() {
            debug!("No FAQ matched query '{}'", query);
            return Ok(SearchOutcome {
                matches: Vec::new(),
                message: Some(NO_MATCHES_MESSAGE.to_string()),
            });
        }

        Ok(SearchOutcome {
            matches: hits.into_iter().map(SearchMatch::from).collect(),
            message: None,
        })
    }

    async fn bounded<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .unwrap_or_else(|_| {
                warn!(
                    "{} did not complete within {:?}",
                    operation, self.call_timeout
                );
                Err(FaqError::Timeout(operation.to_string()))
            })
    }
}
