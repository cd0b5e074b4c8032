//! In-memory domain service adapters behind the intent handler ports.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::{JournalLog, ReminderScheduler, ReminderTicket, ServiceError};

/// Reminder scheduler that keeps tickets in process memory.
#[derive(Debug, Default)]
pub struct InMemoryReminderScheduler {
    tickets: RwLock<Vec<ReminderTicket>>,
}

impl InMemoryReminderScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduled tickets so far (test helper).
    pub async fn tickets(&self) -> Vec<ReminderTicket> {
        self.tickets.read().await.clone()
    }
}

#[async_trait]
impl ReminderScheduler for InMemoryReminderScheduler {
    async fn schedule(&self, task: &str, when: &str) -> Result<ReminderTicket, ServiceError> {
        let ticket = ReminderTicket::new(task, when);
        self.tickets.write().await.push(ticket.clone());
        Ok(ticket)
    }
}

/// Journal log that keeps entries in process memory.
#[derive(Debug, Default)]
pub struct InMemoryJournalLog {
    entries: RwLock<Vec<(String, String)>>,
}

impl InMemoryJournalLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appended (kind, text) entries so far (test helper).
    pub async fn entries(&self) -> Vec<(String, String)> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl JournalLog for InMemoryJournalLog {
    async fn append(&self, kind: &str, text: &str) -> Result<(), ServiceError> {
        self.entries
            .write()
            .await
            .push((kind.to_string(), text.to_string()));
        Ok(())
    }
}
