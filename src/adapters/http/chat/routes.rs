//! Route definitions for the chat endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{get_health, get_provider_health, post_message, ChatAppState};

/// Create the chat router with all endpoints
///
/// # Endpoints
///
/// - `POST /chat/messages` - Dispatch one chat message
/// - `GET /providers/health` - Per-provider health snapshot
/// - `GET /health` - Liveness probe
pub fn routes() -> Router<ChatAppState> {
    Router::new()
        .route("/chat/messages", post(post_message))
        .route("/providers/health", get(get_provider_health))
        .route("/health", get(get_health))
}
