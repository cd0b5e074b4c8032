//! HTTP handlers for the chat endpoints.
//!
//! These handlers connect axum routes to the application layer.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::chat::{
    HandleMessageCommand, HandleMessageError, HandleMessageHandler, ProviderHealthHandler,
};
use crate::domain::dispatcher::Dispatcher;
use crate::domain::routing::HealthTracker;
use crate::domain::session::SessionRegistry;
use crate::ports::MemoryStore;

use super::dto::{
    ChatMessageRequest, ChatMessageResponse, ErrorResponse, ProviderHealthResponse,
};

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct ChatAppState {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<SessionRegistry>,
    pub memory: Arc<dyn MemoryStore>,
    pub health: Arc<HealthTracker>,
}

impl ChatAppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        sessions: Arc<SessionRegistry>,
        memory: Arc<dyn MemoryStore>,
        health: Arc<HealthTracker>,
    ) -> Self {
        Self {
            dispatcher,
            sessions,
            memory,
            health,
        }
    }

    pub fn handle_message_handler(&self) -> HandleMessageHandler {
        HandleMessageHandler::new(
            self.dispatcher.clone(),
            self.sessions.clone(),
            self.memory.clone(),
        )
    }

    pub fn provider_health_handler(&self) -> ProviderHealthHandler {
        ProviderHealthHandler::new(self.health.clone())
    }
}

/// Dispatch a chat message
///
/// POST /chat/messages
pub async fn post_message(
    State(app_state): State<ChatAppState>,
    Json(req): Json<ChatMessageRequest>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let cmd = HandleMessageCommand {
        conversation_id: req.conversation_id,
        message: req.message,
        tier_override: req.tier,
    };

    let handler = app_state.handle_message_handler();
    let result = handler.handle(cmd).await.map_err(|e| match e {
        HandleMessageError::EmptyMessage | HandleMessageError::EmptyConversationId => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(e.to_string())),
        ),
    })?;

    Ok::<_, (StatusCode, Json<ErrorResponse>)>((
        StatusCode::OK,
        Json(ChatMessageResponse::from(result)),
    ))
}

/// Provider health snapshot
///
/// GET /providers/health
pub async fn get_provider_health(
    State(app_state): State<ChatAppState>,
) -> impl IntoResponse {
    let handler = app_state.provider_health_handler();
    let providers = handler.handle().await;

    (StatusCode::OK, Json(ProviderHealthResponse { providers }))
}

/// Liveness probe
///
/// GET /health
pub async fn get_health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
