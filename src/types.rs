//! Core types for posts and comments.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum comment body length, in Unicode scalar values.
pub const MAX_COMMENT_BODY_CHARS: usize = 2000;

/// Unique identifier for a post (assigned by the store, 1-based).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostId(pub u64);

impl fmt::Debug for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostId({})", self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a comment, global across all posts.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommentId(pub u64);

impl fmt::Debug for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommentId({})", self.0)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch (UTC).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A reply attached to exactly one post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Unique identifier (assigned by store).
    pub id: CommentId,

    /// Owning post. Never changes after creation.
    pub post_id: PostId,

    /// Comment this one replies to, if threaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,

    pub body: String,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

/// A top-level content item with its comments in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Unique identifier (assigned by store).
    pub id: PostId,

    pub title: String,

    pub body: String,

    /// Comments on this post, oldest first.
    pub comments: Vec<Comment>,

    pub comments_disabled: bool,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

/// Input for creating a new post (before id/timestamps assigned).
#[derive(Clone, Debug)]
pub struct NewPost {
    pub title: String,
    pub body: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Input for creating a new comment (before id/timestamps assigned).
#[derive(Clone, Debug)]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub body: String,
}

impl NewComment {
    /// Create a top-level comment on a post.
    pub fn new(post_id: PostId, body: impl Into<String>) -> Self {
        Self {
            post_id,
            parent_id: None,
            body: body.into(),
        }
    }

    /// Make this comment a reply to `parent`.
    pub fn reply_to(mut self, parent: CommentId) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Check the body length bound.
    pub fn validate(&self) -> Result<()> {
        validate_comment_body(&self.body)
    }
}

/// Reject bodies longer than [`MAX_COMMENT_BODY_CHARS`] Unicode scalar values.
pub fn validate_comment_body(body: &str) -> Result<()> {
    // Byte length is an upper bound on the char count.
    if body.len() <= MAX_COMMENT_BODY_CHARS {
        return Ok(());
    }
    let len = body.chars().count();
    if len > MAX_COMMENT_BODY_CHARS {
        return Err(StoreError::BodyTooLong {
            len,
            max: MAX_COMMENT_BODY_CHARS,
        });
    }
    Ok(())
}
