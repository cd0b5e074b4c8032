//! Session Context - short-lived, per-conversation working state.
//!
//! Distinct from long-term persisted memory: this is a bounded cache of
//! recent turns and detected entities, owned by the dispatcher for the
//! duration of one conversation. The memory store collaborator is
//! responsible for anything durable.
//!
//! `SessionRegistry` hands out one mutex-guarded context per conversation;
//! holding that lock for the duration of a dispatch serializes messages
//! within a conversation (arrival order), while unrelated conversations
//! proceed concurrently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// One conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            at,
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            at,
        }
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// Bounded per-conversation working state.
#[derive(Debug, Clone)]
pub struct SessionContext {
    conversation_id: String,
    turns: VecDeque<Turn>,
    entities: HashMap<String, String>,
    capacity: usize,
    hydrated: bool,
}

impl SessionContext {
    /// Creates an empty context holding at most `capacity` recent turns.
    ///
    /// Capacity is clamped to at least one turn so the context stays bounded
    /// whatever the caller passes.
    pub fn new(conversation_id: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            conversation_id: conversation_id.into(),
            turns: VecDeque::with_capacity(capacity),
            entities: HashMap::new(),
            capacity,
            hydrated: false,
        }
    }

    /// The conversation this context belongs to.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Recent turns, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Number of retained turns.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Maximum number of retained turns.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a turn, evicting the oldest when over capacity.
    pub fn push_turn(&mut self, turn: Turn) {
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Record a detected entity, replacing any previous value of that type.
    pub fn remember_entity(&mut self, kind: impl Into<String>, value: impl Into<String>) {
        self.entities.insert(kind.into(), value.into());
    }

    /// Most-recently-seen value for an entity type.
    pub fn entity(&self, kind: &str) -> Option<&str> {
        self.entities.get(kind).map(String::as_str)
    }

    /// All known entities.
    pub fn entities(&self) -> &HashMap<String, String> {
        &self.entities
    }

    /// Whether this context has been seeded from the memory store.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Mark this context as seeded.
    pub fn mark_hydrated(&mut self) {
        self.hydrated = true;
    }
}

/// Hands out one serialized session context per conversation.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionContext>>>>,
    capacity: usize,
}

impl SessionRegistry {
    /// Creates a registry whose contexts hold at most `capacity` turns.
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Get or create the context for a conversation.
    ///
    /// Callers hold the returned mutex for the duration of one dispatch;
    /// that is what gives a single conversation arrival-order processing.
    pub async fn session(&self, conversation_id: &str) -> Arc<Mutex<SessionContext>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(conversation_id) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SessionContext::new(
                    conversation_id,
                    self.capacity,
                )))
            })
            .clone()
    }
}
