//! AI Provider Port - Interface for text-generation provider integrations.
//!
//! This port abstracts one callable provider/model pair (Gemini, OpenRouter,
//! etc.) behind a single completion operation, so the orchestrator can walk a
//! fallback chain without coupling to any vendor API.
//!
//! # Design
//!
//! - Provider-agnostic message format
//! - Every failure is classified (`ErrorClass`) so the health tracker can
//!   pick a cooldown per class rather than guessing from error strings
//! - Implementations must be safe to call concurrently (`&self`, `Send + Sync`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port for AI provider interactions.
///
/// Implementations connect to external text-generation services and translate
/// between the provider-specific API and our message format.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a single completion for the given conversation.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Get provider information (name, model).
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for a completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation messages (history + current user message), oldest first.
    pub messages: Vec<Message>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature for response randomness.
    pub temperature: Option<f32>,
    /// Per-attempt timeout the adapter should enforce on its transport.
    pub timeout: Duration,
}

impl CompletionRequest {
    /// Creates an empty request with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            messages: Vec::new(),
            max_tokens: None,
            temperature: None,
            timeout,
        }
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
        self
    }

    /// Sets the full message list.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message.
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions (guides model behavior).
    System,
    /// User input.
    User,
    /// Assistant (model) response.
    Assistant,
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content.
    pub content: String,
    /// Model that generated the response.
    pub model: String,
}

/// Provider identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name as registered (e.g. "gemini-flash").
    pub name: String,
    /// Model identifier (e.g. "gemini-1.5-flash").
    pub model: String,
}

impl ProviderInfo {
    /// Creates new provider info.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Classified provider failure.
///
/// The classification drives cooldown policy: rate limiting and server
/// errors earn a longer cooldown than a plain timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Provider rejected the request due to quota/rate limiting.
    RateLimited,
    /// API key or authentication is invalid.
    AuthInvalid,
    /// The request timed out.
    Timeout,
    /// Provider-side server error (5xx).
    ServerError,
    /// Response could not be parsed, or the request was rejected as invalid.
    Malformed,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorClass::RateLimited => "rate_limited",
            ErrorClass::AuthInvalid => "auth_invalid",
            ErrorClass::Timeout => "timeout",
            ErrorClass::ServerError => "server_error",
            ErrorClass::Malformed => "malformed",
        };
        write!(f, "{}", label)
    }
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthInvalid,

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// Provider-side server error.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error details.
        message: String,
    },

    /// Failed to parse provider response, or invalid request.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Transport-level failure reaching the provider.
    #[error("network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a server error.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Classification used for cooldown decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            ProviderError::RateLimited { .. } => ErrorClass::RateLimited,
            ProviderError::AuthInvalid => ErrorClass::AuthInvalid,
            ProviderError::Timeout { .. } => ErrorClass::Timeout,
            ProviderError::Server { .. } => ErrorClass::ServerError,
            ProviderError::Malformed(_) => ErrorClass::Malformed,
            // An unreachable provider cools down like a failing one.
            ProviderError::Network(_) => ErrorClass::ServerError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_request_builder_works() {
        let request = CompletionRequest::new(Duration::from_secs(30))
            .with_message(MessageRole::User, "Hello")
            .with_max_tokens(100)
            .with_temperature(0.7);

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.messages[0].content, "Hello");
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.timeout, Duration::from_secs(30));
    }

    #[test]
    fn message_constructors_work() {
        let system = Message::system("You are helpful");
        let user = Message::user("Hello");
        let assistant = Message::assistant("Hi there");

        assert_eq!(system.role, MessageRole::System);
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(assistant.role, MessageRole::Assistant);
    }

    #[test]
    fn error_classification_is_exhaustive() {
        assert_eq!(
            ProviderError::rate_limited(30).class(),
            ErrorClass::RateLimited
        );
        assert_eq!(ProviderError::AuthInvalid.class(), ErrorClass::AuthInvalid);
        assert_eq!(
            ProviderError::Timeout { timeout_secs: 30 }.class(),
            ErrorClass::Timeout
        );
        assert_eq!(
            ProviderError::server(502, "bad gateway").class(),
            ErrorClass::ServerError
        );
        assert_eq!(
            ProviderError::malformed("no candidates").class(),
            ErrorClass::Malformed
        );
        assert_eq!(
            ProviderError::network("connection refused").class(),
            ErrorClass::ServerError
        );
    }

    #[test]
    fn error_class_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorClass::RateLimited).unwrap();
        assert_eq!(json, "\"rate_limited\"");

        let json = serde_json::to_string(&ErrorClass::ServerError).unwrap();
        assert_eq!(json, "\"server_error\"");
    }

    #[test]
    fn message_role_serializes_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::rate_limited(30);
        assert_eq!(err.to_string(), "rate limited: retry after 30s");

        let err = ProviderError::server(503, "overloaded");
        assert_eq!(err.to_string(), "server error 503: overloaded");
    }
}
