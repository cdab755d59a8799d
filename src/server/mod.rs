//! HTTP server exposing the steganography operations.
//!
//! Routes:
//! - `POST /api/capacity` JSON `{ image, lsb_bits }`
//! - `POST /api/encode` multipart `image, message, password, lsb_bits, compression`
//! - `POST /api/decode` multipart `image, password, lsb_bits`
//! - `POST /api/analyze` multipart `image`
//! - `GET /health`
//!
//! Every failure answers `{ "success": false, "error": ... }`.

pub mod api;
pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::{AppConfig, EngineConfig, ServerConfig};

/// Errors that can occur while running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: EngineConfig,
}

/// Builds the application router.
pub fn router(engine: EngineConfig, max_body_bytes: usize) -> Router {
    let state = Arc::new(AppState { engine });

    Router::new()
        .route("/api/capacity", post(handlers::capacity_handler))
        .route("/api/encode", post(handlers::encode_handler))
        .route("/api/decode", post(handlers::decode_handler))
        .route("/api/analyze", post(handlers::analyze_handler))
        .route("/health", get(handlers::health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP server for the steganography API.
pub struct Server {
    config: ServerConfig,
    engine: EngineConfig,
}

impl Server {
    /// Creates a server from the application configuration.
    pub fn new(config: &AppConfig) -> Self {
        Self {
            config: config.server.clone(),
            engine: config.engine,
        }
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Binds the configured address and serves until Ctrl+C.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on an already bound listener until `shutdown` completes.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = router(self.engine, self.config.max_body_bytes);
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Server(format!("listener has no local address: {}", e)))?;

        tracing::info!(addr = %addr, "Steganography API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
