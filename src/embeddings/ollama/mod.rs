
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::Embedder;
use crate::FaqError;
use crate::config::OllamaConfig;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Entry of `GET /api/tags`; only the name is used for model validation
#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            agent: build_agent(config.timeout()),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Test connection to Ollama server and verify model availability
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        self.ping().context("Server ping failed")?;
        self.validate_model().context("Model validation failed")?;

        info!(
            "Health check passed for Ollama server at {} with model {}",
            self.base_url, self.model
        );
        Ok(())
    }

    /// Ping the Ollama server to check if it's responsive
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build ping URL")?;

        debug!("Pinging Ollama server at {}", url);

        let response = self
            .agent
            .get(url.as_str())
            .call()
            .context("Failed to ping Ollama server")?;
        read_response(response).context("Failed to ping Ollama server")?;

        debug!("Server ping successful");
        Ok(())
    }

    /// Validate that the configured model is available
    #[inline]
    pub fn validate_model(&self) -> Result<()> {
        debug!("Validating model: {}", self.model);

        let models = self.list_models().context("Failed to list models")?;

        // Ollama reports "name:tag"; a bare configured name matches its ":latest" tag
        let matches_model = |name: &str| {
            name == self.model
                || (!self.model.contains(':') && name == format!("{}:latest", self.model))
        };

        if models.iter().any(|m| matches_model(&m.name)) {
            debug!("Model {} is available", self.model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, available_models
            );
            Err(anyhow!(
                "Model '{}' is not available. Available models: {:?}",
                self.model,
                available_models
            ))
        }
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        debug!("Fetching available models from {}", url);

        let response = self
            .agent
            .get(url.as_str())
            .call()
            .context("Failed to fetch models")?;
        let response_text = read_response(response).context("Failed to fetch models")?;

        let models_response: ModelsResponse =
            serde_json::from_str(&response_text).context("Failed to parse models response")?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// Generate the embedding for a single text input with one provider call
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let embedding = self
            .request_embedding(text)
            .context("Failed to generate embedding")?;

        debug!("Generated embedding with {} dimensions", embedding.len());

        Ok(embedding)
    }

    fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.model,
            input: [text],
        };

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build embedding URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)?;
        let response_text = read_response(response)?;

        let embed_response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        let embedding = embed_response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Ollama response contained no embeddings"))?;

        if embedding.is_empty() {
            return Err(anyhow!("Ollama returned an empty embedding vector"));
        }

        Ok(embedding)
    }
}

fn read_response(mut response: ureq::http::Response<ureq::Body>) -> Result<String> {
    let status = response.status();
    let body = response
        .body_mut()
        .read_to_string()
        .context("Failed to read Ollama response body")?;

    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    warn!("Ollama returned HTTP {}: {}", status.as_u16(), message);
    Err(anyhow!("Ollama returned HTTP {}: {}", status.as_u16(), message))
}

fn is_timeout(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(cause.downcast_ref::<ureq::Error>(), Some(ureq::Error::Timeout(_)))
            || cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::TimedOut)
    })
}

fn to_faq_error(error: &anyhow::Error, operation: &str) -> FaqError {
    if is_timeout(error) {
        FaqError::Timeout(operation.to_string())
    } else {
        FaqError::Embedding(format!("{error:#}"))
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        let client = self.clone();
        let text = text.to_string();

        match tokio::task::spawn_blocking(move || client.generate_embedding(&text)).await {
            Ok(Ok(embedding)) => Ok(embedding),
            Ok(Err(e)) => Err(to_faq_error(&e, "embedding")),
            Err(e) => Err(FaqError::Embedding(format!(
                "Failed to generate embedding: {e}"
            ))),
        }
    }

    async fn check_health(&self) -> crate::Result<()> {
        let client = self.clone();

        match tokio::task::spawn_blocking(move || client.health_check()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(to_faq_error(&e, "embedding health check")),
            Err(e) => Err(FaqError::Embedding(format!("Health check failed: {e}"))),
        }
    }
}
