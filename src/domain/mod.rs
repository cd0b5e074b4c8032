//! Domain - the chat dispatch and provider routing core.
//!
//! - `routing` - task tiers, provider descriptors, health tracking, selection
//! - `orchestrator` - fallback-chain driver over the registered providers
//! - `intent` - declarative match patterns and the handler registry
//! - `session` - per-conversation working context
//! - `dispatcher` - intent-vs-AI decision per inbound message

pub mod dispatcher;
pub mod intent;
pub mod orchestrator;
pub mod routing;
pub mod session;

use thiserror::Error;

/// Malformed registration at startup. Fatal: the process must not serve
/// traffic with a partially-built registry or provider table.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("intent '{intent_id}' has no match patterns")]
    EmptyPatterns { intent_id: String },

    #[error("duplicate intent id: {intent_id}")]
    DuplicateIntent { intent_id: String },

    #[error("intent '{intent_id}' has an invalid pattern: {source}")]
    InvalidPattern {
        intent_id: String,
        #[source]
        source: regex::Error,
    },

    #[error("duplicate provider name: {name}")]
    DuplicateProvider { name: String },

    #[error("provider '{name}' has no tier affinity")]
    NoTierAffinity { name: String },

    #[error("provider '{name}' has no registered adapter")]
    MissingAdapter { name: String },
}
