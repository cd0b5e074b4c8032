//! DTOs for the chat HTTP surface.

use serde::{Deserialize, Serialize};

use crate::application::handlers::chat::HandleMessageResult;
use crate::domain::dispatcher::ReplySource;
use crate::domain::routing::{ProviderHealth, TaskTier};

/// Request body for POST /chat/messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageRequest {
    pub conversation_id: String,
    pub message: String,
    /// Optional explicit tier ("basic", "standard", "complex", "research").
    #[serde(default)]
    pub tier: Option<TaskTier>,
}

/// Response body for POST /chat/messages.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageResponse {
    pub conversation_id: String,
    pub reply: String,
    /// "handler" or "ai".
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub degraded: bool,
}

impl From<HandleMessageResult> for ChatMessageResponse {
    fn from(result: HandleMessageResult) -> Self {
        Self {
            conversation_id: result.conversation_id,
            reply: result.reply,
            source: match result.source {
                ReplySource::Handler => "handler".to_string(),
                ReplySource::Ai => "ai".to_string(),
            },
            provider: result.provider,
            intent: result.intent,
            confidence: result.confidence,
            degraded: result.degraded,
        }
    }
}

/// Response body for GET /providers/health.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealthResponse {
    pub providers: Vec<ProviderHealth>,
}

/// Error payload shared by all chat endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: "bad_request".to_string(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: "internal_error".to_string(),
            message: message.into(),
        }
    }
}
