//! Storage facade shared by every backend.
//!
//! [`Storage`] covers post and comment CRUD. Live subscriptions are a
//! separate capability, [`SubscriptionCapable`], which a backend advertises
//! through [`Storage::subscriptions`]. Backends that cannot push comments
//! (the journal) keep the default `None`.

use crate::error::Result;
use crate::subscriptions::{CommentSubscription, SubscriptionId};
use crate::types::{Comment, NewComment, NewPost, Post, PostId};

/// Post and comment operations every backend provides.
pub trait Storage: Send + Sync {
    /// Create a post. Assigns the id and both timestamps.
    fn create_post(&self, input: NewPost) -> Result<Post>;

    /// All posts in creation order.
    fn get_posts(&self) -> Result<Vec<Post>>;

    /// A single post with its comments.
    fn get_post(&self, id: PostId) -> Result<Post>;

    /// Create a comment on an existing post with comments enabled.
    fn create_comment(&self, input: NewComment) -> Result<Comment>;

    /// Set or clear the "comments disabled" flag.
    fn set_comments_disabled(&self, post_id: PostId, disabled: bool) -> Result<Post>;

    fn disable_comments(&self, post_id: PostId) -> Result<Post> {
        self.set_comments_disabled(post_id, true)
    }

    fn enable_comments(&self, post_id: PostId) -> Result<Post> {
        self.set_comments_disabled(post_id, false)
    }

    /// The live subscription capability, if this backend has one.
    fn subscriptions(&self) -> Option<&dyn SubscriptionCapable> {
        None
    }
}

/// Backends able to push new comments to live subscribers.
pub trait SubscriptionCapable: Send + Sync {
    /// Register for comments created on `post_id` from now on.
    ///
    /// The registration lives until [`unsubscribe`](Self::unsubscribe) is
    /// called for it; callers must unsubscribe when their consumer goes away.
    fn subscribe(&self, post_id: PostId) -> CommentSubscription;

    /// Remove a registration. Unknown or already removed ids are ignored.
    fn unsubscribe(&self, post_id: PostId, id: SubscriptionId);
}
