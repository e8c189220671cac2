//! Entity store: canonical posts and comments.
//!
//! [`EntityTable`] holds the collections and enforces id assignment,
//! timestamping and the comment preconditions. [`InMemoryStorage`] wraps it
//! in a reader/writer lock and wires in the comment notifier.

mod memory;
mod table;

pub use memory::InMemoryStorage;
pub use table::EntityTable;
