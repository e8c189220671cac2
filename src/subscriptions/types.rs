//! Subscription types for live comment delivery.

use crate::types::{Comment, PostId};
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Default per-subscriber buffer capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 64;

/// Configuration for the comment notifier.
#[derive(Clone, Debug)]
pub struct NotifierConfig {
    /// Max undelivered comments buffered per subscriber. Once full, new
    /// comments are skipped for that subscriber until it catches up.
    /// Values below 1 are treated as 1.
    /// Default: 64
    pub buffer_size: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// A live registration for new comments on one post.
///
/// The handle is a lazy sequence of comments: iterating it blocks until the
/// next comment arrives and ends only once the subscription is removed
/// through `unsubscribe`. Dropping the handle without unsubscribing leaves
/// the registration in place until the next comment on the post notices the
/// closed channel and prunes it.
#[derive(Debug)]
pub struct CommentSubscription {
    pub id: SubscriptionId,
    pub post_id: PostId,
    pub(crate) receiver: Receiver<Comment>,
}

impl CommentSubscription {
    /// Receive the next comment (blocking).
    ///
    /// Fails once the subscription has been removed and the buffer is drained.
    pub fn recv(&self) -> Result<Comment, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a comment (non-blocking).
    pub fn try_recv(&self) -> Result<Comment, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Comment, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Comments currently buffered and not yet received.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Iterator for CommentSubscription {
    type Item = Comment;

    fn next(&mut self) -> Option<Comment> {
        self.receiver.recv().ok()
    }
}
