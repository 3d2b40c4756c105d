//! HTTP surface for the FAQ service.

pub mod errors;
pub mod handlers;


use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::Result;
use crate::faq::FaqService;

pub use errors::ApiError;
pub use handlers::{InsertRequest, InsertResponse, SearchParams};

/// Shared handler state; collaborators reach handlers only through here
#[derive(Clone)]
pub struct AppState {
    pub faq: FaqService,
}

impl AppState {
    #[inline]
    pub fn new(faq: FaqService) -> Self {
        Self { faq }
    }
}

#[inline]
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/insert", post(handlers::insert_handler))
        .route("/search", get(handlers::search_handler))
        .route("/health", get(handlers::health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until Ctrl-C is received
#[inline]
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("FAQ API listening on {}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("FAQ API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
