//! Per-post registry broadcasting new comments to live subscribers.

use crate::types::{Comment, PostId};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

use super::types::{CommentSubscription, NotifierConfig, SubscriptionId};

/// Internal subscriber state.
struct Subscriber {
    id: SubscriptionId,
    sender: Sender<Comment>,
}

/// Fans out new comments to the subscribers of each post.
///
/// Delivery never blocks: a subscriber whose buffer is full simply misses
/// the comment. Subscribers are a live tail, not a durable log.
pub struct CommentNotifier {
    /// Active subscribers, grouped by post.
    subscribers: RwLock<HashMap<PostId, Vec<Subscriber>>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
    buffer_size: usize,
}

impl CommentNotifier {
    /// Create a notifier with the default buffer size.
    pub fn new() -> Self {
        Self::with_config(NotifierConfig::default())
    }

    pub fn with_config(config: NotifierConfig) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_size: config.buffer_size.max(1),
        }
    }

    /// Register a new subscriber for comments on `post_id`.
    ///
    /// The caller owns the registration: it must call [`unsubscribe`] when
    /// its consumer goes away, otherwise the entry stays registered.
    ///
    /// [`unsubscribe`]: CommentNotifier::unsubscribe
    pub fn subscribe(&self, post_id: PostId) -> CommentSubscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.buffer_size);

        self.subscribers
            .write()
            .entry(post_id)
            .or_default()
            .push(Subscriber { id, sender });

        debug!(post_id = post_id.0, subscription = id.0, "comment subscription registered");

        CommentSubscription {
            id,
            post_id,
            receiver,
        }
    }

    /// Remove a subscriber. Returns false if it was not registered.
    ///
    /// Dropping the registry's sender closes the channel, so a consumer
    /// blocked in `recv` wakes up with an error instead of hanging.
    pub fn unsubscribe(&self, post_id: PostId, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write();
        let Some(list) = subs.get_mut(&post_id) else {
            return false;
        };
        let Some(pos) = list.iter().position(|s| s.id == id) else {
            return false;
        };

        list.remove(pos);
        if list.is_empty() {
            subs.remove(&post_id);
        }

        debug!(post_id = post_id.0, subscription = id.0, "comment subscription removed");
        true
    }

    /// Deliver `comment` to every subscriber of its post.
    ///
    /// Returns the number of subscribers that accepted it.
    pub fn notify(&self, comment: &Comment) -> usize {
        let post_id = comment.post_id;

        // Snapshot under the lock, deliver after releasing it.
        let targets: Vec<(SubscriptionId, Sender<Comment>)> = {
            let subs = self.subscribers.read();
            match subs.get(&post_id) {
                Some(list) => list.iter().map(|s| (s.id, s.sender.clone())).collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        let mut disconnected = Vec::new();

        for (id, sender) in targets {
            match sender.try_send(comment.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    trace!(
                        post_id = post_id.0,
                        subscription = id.0,
                        comment_id = comment.id.0,
                        "subscriber buffer full, comment skipped"
                    );
                }
                Err(TrySendError::Disconnected(_)) => disconnected.push(id),
            }
        }

        // The receiving half is gone, nobody can consume these any more.
        if !disconnected.is_empty() {
            for id in disconnected {
                if self.unsubscribe(post_id, id) {
                    debug!(post_id = post_id.0, subscription = id.0, "pruned disconnected subscriber");
                }
            }
        }

        delivered
    }

    /// Number of live subscribers for one post.
    pub fn subscriber_count(&self, post_id: PostId) -> usize {
        self.subscribers.read().get(&post_id).map_or(0, Vec::len)
    }

    /// Number of live subscribers across all posts.
    pub fn subscription_count(&self) -> usize {
        self.subscribers.read().values().map(Vec::len).sum()
    }
}

impl Default for CommentNotifier {
    fn default() -> Self {
        Self::new()
    }
}
