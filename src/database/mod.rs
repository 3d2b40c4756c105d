// Database module
// Vector index seam and the LanceDB implementation backing it

#[cfg(test)]
mod tests;

pub mod lancedb;

pub use self::lancedb::LanceVectorStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// FAQ record as handed to the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqRecord {
    /// Unique identifier for this record
    pub id: String,
    /// Embedding of `metadata.question`
    pub values: Vec<f32>,
    pub metadata: Option<FaqMetadata>,
}

/// Question and answer stored alongside a vector.
///
/// Each field is read back independently; a row may carry one without the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl FaqMetadata {
    #[inline]
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            answer: Some(answer.into()),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.question.is_none() && self.answer.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub top_k: usize,
    pub return_metadata: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            top_k: 1,
            return_metadata: true,
        }
    }
}

/// Nearest-neighbor hit returned by [`VectorIndex::query`]
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub id: String,
    /// Similarity to the query vector, higher is closer
    pub score: f32,
    pub values: Vec<f32>,
    pub metadata: Option<FaqMetadata>,
}

/// Store of (id, vector, metadata) tuples answering top-K similarity queries.
///
/// Failures are reported as [`crate::FaqError::Storage`].
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert records, replacing any existing record with the same id
    async fn upsert(&self, records: Vec<FaqRecord>) -> Result<()>;

    /// Return up to `options.top_k` records closest to `vector`, best first
    async fn query(&self, vector: &[f32], options: QueryOptions) -> Result<Vec<VectorMatch>>;

    /// Number of stored records
    async fn count(&self) -> Result<u64>;
}
