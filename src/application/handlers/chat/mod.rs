//! Chat application handlers.

mod handle_message;
mod provider_health;

pub use handle_message::{
    HandleMessageCommand, HandleMessageError, HandleMessageHandler, HandleMessageResult,
};
pub use provider_health::ProviderHealthHandler;
