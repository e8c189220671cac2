//! Durable storage on an append-only journal.
//!
//! Every accepted write is appended to `journal.log` before it is applied to
//! the in-memory tables; opening the directory replays the journal.

mod log;
mod storage;

pub use log::{Journal, JournalEntry, MAX_ENTRY_SIZE};
pub use storage::{JournalConfig, JournalStorage, JOURNAL_FILE};
