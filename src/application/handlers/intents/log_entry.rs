//! LogEntryHandler - appends a journal entry from a matched intent.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::intent::{
    HandlerError, HandlerInvocation, HandlerReply, IntentDescriptor, IntentHandler,
};
use crate::ports::JournalLog;

/// Handles the `log_entry` intent via the journal port.
pub struct LogEntryHandler {
    journal: Arc<dyn JournalLog>,
}

impl LogEntryHandler {
    pub fn new(journal: Arc<dyn JournalLog>) -> Self {
        Self { journal }
    }

    /// The descriptor wiring this handler into the registry.
    pub fn descriptor(journal: Arc<dyn JournalLog>) -> IntentDescriptor {
        IntentDescriptor::new("log_entry", Arc::new(Self::new(journal)))
            .with_phrase("log my {kind}: {text}")
            .with_regex(r"^journal\b\s*(?P<text>.*)$")
            .with_priority(4)
    }
}

#[async_trait]
impl IntentHandler for LogEntryHandler {
    async fn execute(
        &self,
        invocation: HandlerInvocation<'_>,
    ) -> Result<HandlerReply, HandlerError> {
        let kind = invocation
            .slots
            .get("kind")
            .map(String::as_str)
            .unwrap_or("journal");

        let text = invocation
            .slots
            .get("text")
            .map(String::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(invocation.message);

        self.journal.append(kind, text).await?;

        Ok(HandlerReply::new(format!("Logged your {kind} entry.")))
    }
}
