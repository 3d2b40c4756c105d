// Embeddings module
// Turns question and query text into vectors through an external provider

pub mod ollama;

pub use ollama::{ModelInfo, OllamaClient};

use async_trait::async_trait;

use crate::Result;

/// Source of fixed-length embedding vectors.
///
/// One call produces exactly one vector for one input string. Failures are
/// reported as [`crate::FaqError::Embedding`], or [`crate::FaqError::Timeout`]
/// when the provider did not answer in time.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Check that the provider is reachable and can serve the configured model
    async fn check_health(&self) -> Result<()>;
}
