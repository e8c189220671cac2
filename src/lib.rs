//! # Post Comments
//!
//! Storage and live notification core for threaded post discussions.
//!
//! ## Core Concepts
//!
//! - **Posts**: Top-level items; commenting can be disabled per post
//! - **Comments**: Replies on one post, optionally under a parent comment
//! - **Subscriptions**: Per-post live tail of newly created comments
//! - **Backends**: In-memory (with subscriptions) or a durable journal
//!
//! ## Example
//!
//! ```ignore
//! use post_comments::{InMemoryStorage, PostService};
//! use std::sync::Arc;
//!
//! let service = PostService::new(Arc::new(InMemoryStorage::new()));
//!
//! let post = service.create_post("Hello", "First post")?;
//! let subscription = service.subscribe_to_comments(post.id)?;
//!
//! service.create_comment(post.id, None, "Nice post!")?;
//! let comment = subscription.recv()?;
//!
//! service.disable_comments(post.id)?;
//! service.unsubscribe(post.id, subscription.id);
//! ```

pub mod config;
pub mod error;
pub mod journal;
pub mod service;
pub mod storage;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use config::{open_storage, StorageBackend, StorageConfig};
pub use error::{Result, StoreError};
pub use journal::{JournalConfig, JournalStorage};
pub use service::PostService;
pub use storage::{Storage, SubscriptionCapable};
pub use store::{EntityTable, InMemoryStorage};
pub use subscriptions::{CommentNotifier, CommentSubscription, NotifierConfig, SubscriptionId};
pub use types::*;
