//! HTTP + WebSocket transport for the contour interview engine.

pub mod error;
pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use contour_engine::ConversationEngine;
use contour_store::Database;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Shared application state passed to handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub db: Database,
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(http::create_session).get(http::list_sessions))
        .route("/api/sessions/{id}", get(http::get_session))
        .route(
            "/api/sessions/{id}/messages",
            post(http::send_message).get(http::get_messages),
        )
        .route("/api/sessions/{id}/contour", get(http::get_contour))
        .route("/api/sessions/{id}/contour/approve", post(http::approve_contour))
        .route("/api/sessions/{id}/followups", get(http::get_followups))
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(http::health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Handle returned by `start()` — keeps the server task alive.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}

/// Bind and serve. Port 0 picks a free port (tests).
pub async fn start(config: ServerConfig, state: AppState) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "contour server started");

    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle { port: local_addr.port(), _server: server })
}
