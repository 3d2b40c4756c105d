use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::database::{LanceVectorStore, VectorIndex};
use crate::embeddings::{Embedder, OllamaClient};
use crate::faq::FaqService;
use crate::server::{self, AppState};
use crate::{FaqError, Result};

/// Wire the Ollama client and the LanceDB store into a service
#[inline]
pub async fn build_service(config: &Config) -> Result<FaqService> {
    let embedder = OllamaClient::new(&config.ollama).map_err(FaqError::Other)?;
    let index = LanceVectorStore::new(config).await?;

    Ok(FaqService::from_config(
        config,
        Arc::new(embedder),
        Arc::new(index),
    ))
}

/// Start the HTTP API
#[inline]
pub async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut server_config = config.server.clone();
    if let Some(host) = host {
        server_config
            .set_host(host)
            .map_err(|e| FaqError::Config(e.to_string()))?;
    }
    if let Some(port) = port {
        server_config
            .set_port(port)
            .map_err(|e| FaqError::Config(e.to_string()))?;
    }
    let addr: SocketAddr = server_config
        .listen_addr()
        .map_err(|e| FaqError::Config(e.to_string()))?;

    let service = build_service(config).await?;

    match service.embedder().check_health().await {
        Ok(()) => info!("Embedding provider is ready (model {})", config.ollama.model),
        Err(e) => warn!(
            "Embedding provider is not ready, requests will fail until it is: {}",
            e
        ),
    }
    info!(
        "Vector index holds {} FAQs",
        service.index().count().await?
    );

    server::serve(addr, AppState::new(service)).await
}

/// Insert one FAQ and print its id
#[inline]
pub async fn insert_faq(config: &Config, question: &str, answer: &str) -> Result<()> {
    let service = build_service(config).await?;
    let outcome = service.insert(question, answer).await?;

    println!("Stored FAQ with ID: {}", outcome.id);
    Ok(())
}

/// Search FAQs and print the JSON response body
#[inline]
pub async fn search_faqs(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    let service = build_service(config).await?;
    let outcome = service.search(query, top_k).await?;

    let rendered = serde_json::to_string_pretty(&outcome)
        .map_err(|e| FaqError::Other(anyhow::anyhow!("Failed to render results: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Print the number of stored FAQs and provider status
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    let index = LanceVectorStore::new(config).await?;
    let embedder = OllamaClient::new(&config.ollama).map_err(FaqError::Other)?;

    println!("Vector data: {}", config.vector_database_path().display());
    println!("Stored FAQs: {}", index.count().await?);
    match embedder.check_health().await {
        Ok(()) => println!("Ollama: ok (model {})", embedder.model()),
        Err(e) => println!("Ollama: unavailable ({})", e),
    }
    Ok(())
}
