//! CreateReminderHandler - schedules a reminder from a matched intent.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::intent::{
    HandlerError, HandlerInvocation, HandlerReply, IntentDescriptor, IntentHandler,
};
use crate::ports::ReminderScheduler;

/// Handles the `create_reminder` intent via the scheduler port.
pub struct CreateReminderHandler {
    scheduler: Arc<dyn ReminderScheduler>,
}

impl CreateReminderHandler {
    pub fn new(scheduler: Arc<dyn ReminderScheduler>) -> Self {
        Self { scheduler }
    }

    /// The descriptor wiring this handler into the registry.
    pub fn descriptor(scheduler: Arc<dyn ReminderScheduler>) -> IntentDescriptor {
        IntentDescriptor::new("create_reminder", Arc::new(Self::new(scheduler)))
            .with_keywords(["remind me"])
            .with_phrase("remind me to {task} at {time}")
            .with_priority(5)
    }
}

#[async_trait]
impl IntentHandler for CreateReminderHandler {
    async fn execute(
        &self,
        invocation: HandlerInvocation<'_>,
    ) -> Result<HandlerReply, HandlerError> {
        let task = invocation
            .slots
            .get("task")
            .map(String::as_str)
            .ok_or(HandlerError::MissingSlot("task"))?;

        // A message without an explicit time can lean on the one most
        // recently seen in this conversation.
        let when = invocation
            .slots
            .get("time")
            .map(String::as_str)
            .or_else(|| invocation.session.entity("time"))
            .ok_or(HandlerError::MissingSlot("time"))?;

        let ticket = self.scheduler.schedule(task, when).await?;

        Ok(HandlerReply::new(format!(
            "Okay, I'll remind you to {} at {}.",
            ticket.task, ticket.when
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::services::InMemoryReminderScheduler;
    use crate::domain::session::SessionContext;
    use std::collections::HashMap;

    fn slots(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn schedules_from_slots() {
        let scheduler = Arc::new(InMemoryReminderScheduler::new());
        let handler = CreateReminderHandler::new(scheduler.clone());
        let session = SessionContext::new("conv-1", 12);
        let slots = slots(&[("task", "call mom"), ("time", "5pm")]);

        let reply = handler
            .execute(HandlerInvocation {
                message: "remind me to call mom at 5pm",
                slots: &slots,
                session: &session,
            })
            .await
            .unwrap();

        assert_eq!(reply.text, "Okay, I'll remind you to call mom at 5pm.");
        assert_eq!(scheduler.tickets().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_task_is_an_error() {
        let handler =
            CreateReminderHandler::new(Arc::new(InMemoryReminderScheduler::new()));
        let session = SessionContext::new("conv-1", 12);
        let slots = slots(&[("time", "5pm")]);

        let err = handler
            .execute(HandlerInvocation {
                message: "remind me",
                slots: &slots,
                session: &session,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::MissingSlot("task")));
    }

    #[tokio::test]
    async fn time_falls_back_to_session_entity() {
        let scheduler = Arc::new(InMemoryReminderScheduler::new());
        let handler = CreateReminderHandler::new(scheduler.clone());
        let mut session = SessionContext::new("conv-1", 12);
        session.remember_entity("time", "7pm");
        let slots = slots(&[("task", "stretch")]);

        let reply = handler
            .execute(HandlerInvocation {
                message: "remind me to stretch",
                slots: &slots,
                session: &session,
            })
            .await
            .unwrap();

        assert!(reply.text.contains("7pm"));
    }
}
