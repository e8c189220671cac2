//! Volatile storage backend with live comment subscriptions.

use crate::error::Result;
use crate::storage::{Storage, SubscriptionCapable};
use crate::subscriptions::{CommentNotifier, CommentSubscription, NotifierConfig, SubscriptionId};
use crate::types::{Comment, NewComment, NewPost, Post, PostId, Timestamp};
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};

use super::EntityTable;

/// In-memory post/comment store.
///
/// Every write takes the table's write lock for its whole check-then-mutate
/// sequence, so disabling comments and creating a comment on the same post
/// always serialize. New comments are handed to the notifier after the table
/// lock is released.
pub struct InMemoryStorage {
    entities: RwLock<EntityTable>,

    notifier: CommentNotifier,

    /// Orders fan-out by comment creation.
    publish: PublishQueue,
}

/// Ticket line for fan-out.
///
/// A writer draws a ticket while it still holds the table write lock, then
/// waits for its turn with the table unlocked. Readers and other writers
/// only ever wait on the table for the mutation itself, never for a fan-out.
struct PublishQueue {
    /// Next ticket to hand out. Only drawn under the table write lock.
    next_ticket: AtomicU64,
    /// Ticket whose fan-out may run now.
    turn: Mutex<u64>,
    turn_changed: Condvar,
}

impl PublishQueue {
    fn new() -> Self {
        Self {
            next_ticket: AtomicU64::new(0),
            turn: Mutex::new(0),
            turn_changed: Condvar::new(),
        }
    }

    fn take_ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst)
    }

    /// Run `publish` once every earlier ticket has been published.
    fn publish_in_turn(&self, ticket: u64, publish: impl FnOnce()) {
        let mut turn = self.turn.lock();
        while *turn != ticket {
            self.turn_changed.wait(&mut turn);
        }
        publish();
        *turn += 1;
        self.turn_changed.notify_all();
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::with_notifier_config(NotifierConfig::default())
    }

    pub fn with_notifier_config(config: NotifierConfig) -> Self {
        Self {
            entities: RwLock::new(EntityTable::new()),
            notifier: CommentNotifier::with_config(config),
            publish: PublishQueue::new(),
        }
    }

    /// The comment notifier owned by this store.
    pub fn notifier(&self) -> &CommentNotifier {
        &self.notifier
    }

    /// Total number of comments across all posts.
    pub fn comment_count(&self) -> usize {
        self.entities.read().comment_count()
    }

    /// Total number of posts.
    pub fn post_count(&self) -> usize {
        self.entities.read().post_count()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for InMemoryStorage {
    fn create_post(&self, input: NewPost) -> Result<Post> {
        let mut entities = self.entities.write();
        Ok(entities.create_post(input, Timestamp::now()))
    }

    fn get_posts(&self) -> Result<Vec<Post>> {
        Ok(self.entities.read().posts())
    }

    fn get_post(&self, id: PostId) -> Result<Post> {
        self.entities.read().post(id)
    }

    fn create_comment(&self, input: NewComment) -> Result<Comment> {
        input.validate()?;

        let mut entities = self.entities.write();
        let comment = entities.create_comment(input, Timestamp::now())?;
        let ticket = self.publish.take_ticket();
        drop(entities);

        self.publish.publish_in_turn(ticket, || {
            self.notifier.notify(&comment);
        });
        Ok(comment)
    }

    fn set_comments_disabled(&self, post_id: PostId, disabled: bool) -> Result<Post> {
        let mut entities = self.entities.write();
        entities.set_comments_disabled(post_id, disabled, Timestamp::now())
    }

    fn subscriptions(&self) -> Option<&dyn SubscriptionCapable> {
        Some(self)
    }
}

impl SubscriptionCapable for InMemoryStorage {
    fn subscribe(&self, post_id: PostId) -> CommentSubscription {
        self.notifier.subscribe(post_id)
    }

    fn unsubscribe(&self, post_id: PostId, id: SubscriptionId) {
        self.notifier.unsubscribe(post_id, id);
    }
}
