//! Intent matching - declarative patterns, handlers, and the registry.

pub mod handler;
pub mod pattern;
pub mod registry;

pub use handler::{HandlerError, HandlerInvocation, HandlerReply, IntentHandler};
pub use pattern::PatternSpec;
pub use registry::{IntentDescriptor, IntentRegistry, IntentRegistryBuilder, MatchResult};
