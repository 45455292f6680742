//! Process-liveness HTTP endpoint
//!
//! Answers pings with a static payload. Runs beside the coordinator and knows
//! nothing about rooms.

use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET / - static liveness payload
async fn root() -> &'static str {
    "running"
}

/// GET /health - status with module and version
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_string(),
        module: "jukebox_player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
}

/// Serve the liveness router on all interfaces until the task is dropped
pub async fn serve(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Liveness endpoint listening on http://{}", addr);

    axum::serve(listener, router())
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))
}
