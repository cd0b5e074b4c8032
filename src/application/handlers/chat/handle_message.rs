//! HandleMessageHandler - one inbound chat message, end to end.
//!
//! Serializes messages within a conversation (the session mutex is held for
//! the whole dispatch), hydrates the working context from long-term memory
//! on first contact, and mirrors both turns back into the memory store.
//! Memory failures are absorbed: the reply still goes out.

use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

use crate::domain::dispatcher::{Dispatcher, ReplySource};
use crate::domain::routing::TaskTier;
use crate::domain::session::{SessionRegistry, Turn};
use crate::ports::MemoryStore;

/// Command to dispatch one user message.
#[derive(Debug, Clone)]
pub struct HandleMessageCommand {
    pub conversation_id: String,
    pub message: String,
    /// Explicit tier request; `None` lets the dispatcher derive one.
    pub tier_override: Option<TaskTier>,
}

/// Result of dispatching a message.
#[derive(Debug, Clone)]
pub struct HandleMessageResult {
    pub conversation_id: String,
    pub reply: String,
    pub source: ReplySource,
    pub provider: Option<String>,
    pub intent: Option<String>,
    pub confidence: Option<f64>,
    pub degraded: bool,
}

/// Error type for dispatching messages.
#[derive(Debug, Clone)]
pub enum HandleMessageError {
    /// The message was empty or whitespace.
    EmptyMessage,
    /// The conversation id was empty or whitespace.
    EmptyConversationId,
}

impl std::fmt::Display for HandleMessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleMessageError::EmptyMessage => write!(f, "Message must not be empty"),
            HandleMessageError::EmptyConversationId => {
                write!(f, "Conversation id must not be empty")
            }
        }
    }
}

impl std::error::Error for HandleMessageError {}

/// Handler for inbound chat messages.
pub struct HandleMessageHandler {
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionRegistry>,
    memory: Arc<dyn MemoryStore>,
}

impl HandleMessageHandler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        sessions: Arc<SessionRegistry>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            dispatcher,
            sessions,
            memory,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleMessageCommand,
    ) -> Result<HandleMessageResult, HandleMessageError> {
        let conversation_id = cmd.conversation_id.trim();
        if conversation_id.is_empty() {
            return Err(HandleMessageError::EmptyConversationId);
        }
        let message = cmd.message.trim();
        if message.is_empty() {
            return Err(HandleMessageError::EmptyMessage);
        }

        let session_handle = self.sessions.session(conversation_id).await;
        let mut session = session_handle.lock().await;

        if !session.is_hydrated() {
            match self
                .memory
                .recent_turns(conversation_id, session.capacity())
                .await
            {
                Ok(turns) => {
                    for turn in turns {
                        session.push_turn(turn);
                    }
                }
                Err(err) => {
                    warn!(
                        conversation = conversation_id,
                        error = %err,
                        "memory hydration failed, starting from an empty context"
                    );
                }
            }
            session.mark_hydrated();
        }

        let now = Utc::now();
        let outcome = self
            .dispatcher
            .handle(message, &mut session, cmd.tier_override, now)
            .await;

        // Durable history is best effort; a reply beats a consistent log.
        if let Err(err) = self
            .memory
            .append_turn(conversation_id, Turn::user(message, now))
            .await
        {
            warn!(conversation = conversation_id, error = %err, "failed to persist user turn");
        }
        if let Err(err) = self
            .memory
            .append_turn(conversation_id, Turn::assistant(outcome.reply.clone(), now))
            .await
        {
            warn!(conversation = conversation_id, error = %err, "failed to persist reply turn");
        }

        Ok(HandleMessageResult {
            conversation_id: conversation_id.to_string(),
            reply: outcome.reply,
            source: outcome.source,
            provider: outcome.provider,
            intent: outcome.intent,
            confidence: outcome.confidence,
            degraded: outcome.degraded,
        })
    }
}
