//! Domain service adapters.

mod in_memory;

pub use in_memory::{InMemoryJournalLog, InMemoryReminderScheduler};
