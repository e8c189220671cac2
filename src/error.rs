//! Error types for the post/comment store.

use crate::types::{CommentId, PostId};
use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Comment not found: {0}")]
    CommentNotFound(CommentId),

    #[error("Comments are disabled for post {0}")]
    CommentsDisabled(PostId),

    #[error("Comment body too long: {len} characters (max {max})")]
    BodyTooLong { len: usize, max: usize },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Checksum mismatch: expected {expected}, got {got}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Invalid journal format: {0}")]
    InvalidFormat(String),

    #[error("Journal entry too large: {size} bytes (max {max})")]
    EntryTooLarge { size: usize, max: usize },

    #[error("Journal unusable after a failed rollback: {0}")]
    Poisoned(String),

    #[error("Journal is locked by another process")]
    Locked,

    #[error("Journal not initialized")]
    NotInitialized,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StoreError {
    /// True for errors caused by a reference to a post or comment that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::PostNotFound(_) | StoreError::CommentNotFound(_)
        )
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StoreError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StoreError::Deserialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
