//! Request-facing entry point over any storage backend.
//!
//! [`PostService`] is what a transport layer (GraphQL resolvers, HTTP
//! handlers) calls. It validates input before touching storage and turns a
//! missing subscription capability into [`StoreError::Unsupported`].

use crate::error::{Result, StoreError};
use crate::storage::Storage;
use crate::subscriptions::{CommentSubscription, SubscriptionId};
use crate::types::{validate_comment_body, Comment, CommentId, NewComment, NewPost, Post, PostId};
use std::sync::Arc;

/// Post/comment operations with validation and capability checks.
#[derive(Clone)]
pub struct PostService {
    storage: Arc<dyn Storage>,
}

impl PostService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The backing storage.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn create_post(&self, title: impl Into<String>, body: impl Into<String>) -> Result<Post> {
        self.storage.create_post(NewPost::new(title, body))
    }

    pub fn posts(&self) -> Result<Vec<Post>> {
        self.storage.get_posts()
    }

    pub fn post(&self, id: PostId) -> Result<Post> {
        self.storage.get_post(id)
    }

    /// Create a comment. Bodies over the length limit never reach storage.
    pub fn create_comment(
        &self,
        post_id: PostId,
        parent_id: Option<CommentId>,
        body: impl Into<String>,
    ) -> Result<Comment> {
        let body = body.into();
        validate_comment_body(&body)?;

        self.storage.create_comment(NewComment {
            post_id,
            parent_id,
            body,
        })
    }

    pub fn set_comments_disabled(&self, post_id: PostId, disabled: bool) -> Result<Post> {
        self.storage.set_comments_disabled(post_id, disabled)
    }

    pub fn disable_comments(&self, post_id: PostId) -> Result<Post> {
        self.storage.disable_comments(post_id)
    }

    pub fn enable_comments(&self, post_id: PostId) -> Result<Post> {
        self.storage.enable_comments(post_id)
    }

    /// Whether the backend can push live comments.
    pub fn supports_subscriptions(&self) -> bool {
        self.storage.subscriptions().is_some()
    }

    /// Subscribe to new comments on a post.
    ///
    /// The caller must pass the returned id to [`unsubscribe`](Self::unsubscribe)
    /// when its consumer goes away (connection closed, request cancelled).
    pub fn subscribe_to_comments(&self, post_id: PostId) -> Result<CommentSubscription> {
        let capability = self.storage.subscriptions().ok_or_else(|| {
            StoreError::Unsupported("storage backend does not support comment subscriptions".into())
        })?;
        Ok(capability.subscribe(post_id))
    }

    /// Remove a subscription. Repeated calls and unknown ids are ignored.
    pub fn unsubscribe(&self, post_id: PostId, id: SubscriptionId) {
        if let Some(capability) = self.storage.subscriptions() {
            capability.unsubscribe(post_id, id);
        }
    }
}
