//! Intent handler seam - the callable side of a registered intent.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use crate::domain::session::SessionContext;
use crate::ports::ServiceError;

/// A handler bound to an intent descriptor.
///
/// Handlers may mutate external collaborators (domain services) through
/// their own ports; the session context is read-only here, the dispatcher
/// owns its mutation.
#[async_trait]
pub trait IntentHandler: Send + Sync {
    /// Execute the intent with the extracted slots.
    async fn execute(&self, invocation: HandlerInvocation<'_>)
        -> Result<HandlerReply, HandlerError>;
}

/// Everything a handler gets to see for one dispatch.
#[derive(Debug)]
pub struct HandlerInvocation<'a> {
    /// Original user message.
    pub message: &'a str,
    /// Slots extracted by the winning pattern.
    pub slots: &'a HashMap<String, String>,
    /// The conversation's working context.
    pub session: &'a SessionContext,
}

/// Structured reply from a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerReply {
    pub text: String,
}

impl HandlerReply {
    /// Creates a reply.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A matched handler failed; the dispatcher falls back to the AI path
/// instead of surfacing this to the user.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("required slot missing: {0}")]
    MissingSlot(&'static str),

    #[error("collaborator failed: {0}")]
    Collaborator(String),
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        HandlerError::Collaborator(err.to_string())
    }
}
