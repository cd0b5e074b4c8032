//! Reminder Scheduler Port - Interface for the reminder domain service.
//!
//! Invoked by the `create_reminder` intent handler. The dispatcher does not
//! know how reminders are stored or delivered.

use async_trait::async_trait;
use uuid::Uuid;

use super::ServiceError;

/// Port for scheduling reminders.
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Schedule a reminder for a task at a (free-text) time.
    async fn schedule(&self, task: &str, when: &str) -> Result<ReminderTicket, ServiceError>;
}

/// Receipt for a scheduled reminder.
#[derive(Debug, Clone)]
pub struct ReminderTicket {
    pub id: Uuid,
    pub task: String,
    pub when: String,
}

impl ReminderTicket {
    /// Creates a ticket with a fresh id.
    pub fn new(task: impl Into<String>, when: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            task: task.into(),
            when: when.into(),
        }
    }
}
