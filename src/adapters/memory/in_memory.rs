//! In-memory MemoryStore adapter.
//!
//! Durable enough for development and tests; a real deployment swaps this
//! for a persistent implementation of the same port.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::session::Turn;
use crate::ports::{MemoryStore, MemoryStoreError};

/// Conversation history held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryMemoryStore {
    turns: RwLock<HashMap<String, Vec<Turn>>>,
}

impl InMemoryMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total turns stored for a conversation (test helper).
    pub async fn turn_count(&self, conversation_id: &str) -> usize {
        let turns = self.turns.read().await;
        turns.get(conversation_id).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn recent_turns(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Turn>, MemoryStoreError> {
        let turns = self.turns.read().await;
        let history = turns.get(conversation_id).map(Vec::as_slice).unwrap_or(&[]);
        let start = history.len().saturating_sub(limit);
        Ok(history[start..].to_vec())
    }

    async fn append_turn(
        &self,
        conversation_id: &str,
        turn: Turn,
    ) -> Result<(), MemoryStoreError> {
        let mut turns = self.turns.write().await;
        turns
            .entry(conversation_id.to_string())
            .or_default()
            .push(turn);
        Ok(())
    }
}
