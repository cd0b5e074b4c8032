//! Memory Store Port - Interface for long-term conversation memory.
//!
//! The session context held by the dispatcher is a working cache only; this
//! port is the injected collaborator responsible for durable turn history.
//! The core only needs a get/append surface and treats everything behind it
//! as opaque.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::Turn;

/// Port for the long-term conversation memory collaborator.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Read up to `limit` most recent turns for a conversation, oldest first.
    async fn recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, MemoryStoreError>;

    /// Append one turn to a conversation's history.
    async fn append_turn(&self, conversation_id: &str, turn: Turn)
        -> Result<(), MemoryStoreError>;
}

/// Memory store errors.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// The backing store could not be reached.
    #[error("memory store unavailable: {0}")]
    Unavailable(String),
}
