//! Intent handlers - application-layer implementations behind the registry.

mod create_reminder;
mod log_entry;

pub use create_reminder::CreateReminderHandler;
pub use log_entry::LogEntryHandler;
