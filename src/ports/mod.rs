//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! ## AI Ports
//!
//! - `AiProvider` - One callable provider/model pair behind a completion call
//!
//! ## Collaborator Ports
//!
//! - `MemoryStore` - Long-term conversation memory (read/append turns)
//! - `ReminderScheduler` - Domain service behind the reminder intent
//! - `JournalLog` - Domain service behind the journaling intent

mod ai_provider;
mod journal_log;
mod memory_store;
mod reminder_scheduler;

pub use ai_provider::{
    AiProvider, CompletionRequest, CompletionResponse, ErrorClass, Message, MessageRole,
    ProviderError, ProviderInfo,
};
pub use journal_log::JournalLog;
pub use memory_store::{MemoryStore, MemoryStoreError};
pub use reminder_scheduler::{ReminderScheduler, ReminderTicket};

use thiserror::Error;

/// Errors from domain service collaborators.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The collaborator could not complete the operation.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}
