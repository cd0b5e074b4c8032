//! Journal Log Port - Interface for the journaling domain service.
//!
//! Invoked by the `log_entry` intent handler to persist a free-text entry of
//! a given kind (mood, journal, note).

use async_trait::async_trait;

use super::ServiceError;

/// Port for appending journal entries.
#[async_trait]
pub trait JournalLog: Send + Sync {
    /// Append an entry of the given kind.
    async fn append(&self, kind: &str, text: &str) -> Result<(), ServiceError>;
}
