//! Secret Santa server - participant registry and cyclic gift assignment

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod models;
pub mod registry;
pub mod session;
pub mod store;
pub mod websocket;

use axum::{routing::get, Router};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Default)]
pub struct AppState {
    pub store: store::Store,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Build the router with all HTTP and WebSocket routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket::handler))
        .route("/api/participants", get(api::list_participants))
        .route("/api/participants/:id/receiver", get(api::get_receiver))
        .route("/api/assignments", get(api::get_assignments))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
